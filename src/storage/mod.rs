//! Storage Module
//!
//! The in-memory [`Store`]: a string keyspace and a hash keyspace, each behind
//! its own `RwLock`. Nothing is persisted and nothing expires.
//!
//! ## Example
//!
//! ```
//! use respkv::storage::Store;
//! use bytes::Bytes;
//! use std::sync::Arc;
//!
//! let store = Arc::new(Store::new());
//!
//! store.set(Bytes::from("name"), Bytes::from("blue"));
//! assert_eq!(store.get(b"name"), Some(Bytes::from("blue")));
//! assert_eq!(store.hgetall(b"nothing"), None);
//! ```

pub mod engine;

pub use engine::{HashFields, Store};
