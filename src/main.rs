//! respkv server entry point.
//!
//! Parses arguments, sets up logging, builds the store and command table,
//! and serves connections until Ctrl+C.

use respkv::commands::{CommandHandler, CommandRegistry};
use respkv::config::{help_text, CliAction, Config};
use respkv::connection::ConnectionStats;
use respkv::server::serve;
use respkv::storage::Store;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(config)) => config,
        Ok(CliAction::Help) => {
            println!("{}", help_text());
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("respkv version {}", respkv::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", help_text());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!(version = respkv::VERSION, "Starting respkv");

    // One store for the whole process, shared by every connection
    let store = Arc::new(Store::new());
    let registry = Arc::new(CommandRegistry::new());
    info!(commands = ?registry.names(), "Command table ready");

    let handler = CommandHandler::with_registry(store, registry);
    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        address = %config.bind_address(),
        max_depth = config.max_depth,
        max_bulk_size = config.max_bulk_size,
        "Listening"
    );

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    serve(listener, handler, config.parser(), stats, shutdown).await;

    info!("Server shutdown complete");
    Ok(())
}
