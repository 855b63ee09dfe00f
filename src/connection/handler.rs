//! Connection Handler Module
//!
//! This module handles individual client connections.
//! Each client gets its own task that runs a loop: read one request, execute
//! it, write the response, repeat.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read bytes from socket  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Decode one RESP value   │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Execute command         │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Write + flush response  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Client disconnects / protocol error / non-array request
//!        │
//!        ▼
//! 5. Handler task ends, stream dropped
//! ```
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. TCP is a stream, so a read may
//! return part of a request or several requests at once. Requests already in
//! the buffer are handled strictly in order, and each response is flushed
//! before the next request is decoded.
//!
//! An incomplete request is decoded again from its first byte after every
//! read. A large array trickling in over many small reads therefore costs
//! time quadratic in its size, bounded by the buffer cap
//! (`max_bulk_size` + 64 KB). Lower `--max-bulk-size` to tighten that bound.

use crate::commands::CommandHandler;
use crate::protocol::{ProtocolError, RespParser, RespValue};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Read buffer headroom on top of the largest allowed bulk payload (64 KB)
const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Logs the running totals at info level.
    pub fn log_totals(&self) {
        info!(
            connections_accepted = self.connections_accepted.load(Ordering::Relaxed),
            active_connections = self.active_connections.load(Ordering::Relaxed),
            commands_processed = self.commands_processed.load(Ordering::Relaxed),
            bytes_read = self.bytes_read.load(Ordering::Relaxed),
            bytes_written = self.bytes_written.load(Ordering::Relaxed),
            "Connection totals"
        );
    }
}

/// Handles a single client connection.
///
/// Owns the read buffer and the stream; shares only the dispatcher (and
/// through it the store) with other connections.
pub struct ConnectionHandler<S> {
    /// The client stream
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Upper bound on buffered, not yet decoded bytes
    max_buffer: usize,

    /// The command dispatcher (shared across connections)
    command_handler: CommandHandler,

    /// RESP decoder
    parser: RespParser,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream
    /// * `addr` - The client's socket address
    /// * `command_handler` - The dispatcher for executing commands
    /// * `parser` - Decoder carrying the configured limits
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        parser: RespParser,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            max_buffer: parser.max_bulk_size().saturating_add(MAX_BUFFER_SIZE),
            command_handler,
            parser,
            stats,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Returns when the client disconnects or the connection fails. The
    /// returned error says why.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    info!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        debug!(
            client = %self.addr,
            active_connections = self.stats.active_connections.load(Ordering::Relaxed),
            commands_processed = self.stats.commands_processed.load(Ordering::Relaxed),
            "Connection closed"
        );
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(request) = self.try_parse_request()? {
                let request = match request {
                    RespValue::Array(items) => items,
                    other => {
                        warn!(client = %self.addr, request = %other, "Request is not an array");
                        return Err(ConnectionError::InvalidRequest(other.to_string()));
                    }
                };

                match self.command_handler.execute(&request) {
                    Some(response) => {
                        self.stats.command_processed();
                        trace!(client = %self.addr, response = %response, "Command result");
                        self.send_response(&response).await?;
                    }
                    None => debug!(client = %self.addr, "Empty request, nothing to reply"),
                }
            }

            self.read_more_data().await?;
        }
    }

    /// Attempts to decode one request from the buffer.
    fn try_parse_request(&mut self) -> Result<Option<RespValue>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer) {
            Ok(Some((value, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed request"
                );
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete request, need more data"
                );
                Ok(None)
            }
            Err(e) => {
                // Framing is lost; no reply is possible
                warn!(client = %self.addr, error = %e, "Parse error");
                Err(ConnectionError::ParseError(e))
            }
        }
    }

    /// Reads more data from the stream into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= self.max_buffer {
            warn!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            return if self.buffer.is_empty() {
                Err(ConnectionError::ClientDisconnected)
            } else {
                // Stream closed in the middle of a frame
                Err(ConnectionError::UnexpectedEof)
            };
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Sends a response to the client.
    async fn send_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent response");
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed RESP input
    #[error("Parse error: {0}")]
    ParseError(#[from] ProtocolError),

    /// Client disconnected between requests
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Stream closed in the middle of a request
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// A well-formed value that is not an array arrived as a request
    #[error("Invalid request, expected array: {0}")]
    InvalidRequest(String),

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a client connection.
///
/// Creates a [`ConnectionHandler`] and runs it to completion. Errors have
/// already been logged by the handler and end only this connection.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    parser: RespParser,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, parser, stats);
    if let Err(e) = handler.run().await {
        trace!(client = %addr, error = %e, "Connection task finished");
    }
}
