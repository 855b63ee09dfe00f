//! # respkv - A Minimal RESP Key-Value Server
//!
//! respkv is an in-memory key-value server that speaks the Redis
//! Serialization Protocol (RESP), so `redis-cli` and ordinary Redis client
//! libraries can talk to it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              respkv                                 │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │              │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │              │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘              │
//! │                            │                  │ registry lookup     │
//! │                            ▼                  ▼                     │
//! │                     ┌─────────────┐    ┌──────────────────────────┐ │
//! │                     │   RESP      │    │          Store           │ │
//! │                     │   Parser /  │    │  ┌────────┐ ┌─────────┐  │ │
//! │                     │   Encoder   │    │  │strings │ │ hashes  │  │ │
//! │                     └─────────────┘    │  │RwLock  │ │ RwLock  │  │ │
//! │                                        │  └────────┘ └─────────┘  │ │
//! │                                        └──────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use respkv::commands::CommandHandler;
//! use respkv::connection::ConnectionStats;
//! use respkv::protocol::RespParser;
//! use respkv::server::serve;
//! use respkv::storage::Store;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(Store::new());
//!     let handler = CommandHandler::new(store);
//!     let listener = TcpListener::bind("127.0.0.1:6379").await.unwrap();
//!
//!     serve(
//!         listener,
//!         handler,
//!         RespParser::new(),
//!         Arc::new(ConnectionStats::new()),
//!         std::future::pending(),
//!     )
//!     .await;
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `PING [message]`
//! - `SET key value` / `GET key`
//! - `HSET hash field value` / `HGET hash field` / `HGETALL hash`
//!
//! Unknown commands are answered with an empty simple string (`+\r\n`).
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP value model, decoder and encoder
//! - [`storage`]: The shared store
//! - [`commands`]: Command registry, dispatcher and handlers
//! - [`connection`]: Per-client request loop
//! - [`server`]: Accept loop
//! - [`config`]: Command-line configuration
//!
//! Nothing is persisted, nothing expires, and the store has no size limit.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

pub use commands::{CommandError, CommandHandler, CommandRegistry};
pub use config::{CliAction, Config, ConfigError};
pub use connection::{handle_connection, ConnectionError, ConnectionStats};
pub use protocol::{ProtocolError, RespParser, RespValue};
pub use storage::Store;

/// The default port (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
