//! TCP accept loop.
//!
//! One task per accepted connection. Every task gets a clone of the same
//! [`CommandHandler`], so all clients see one store.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::protocol::RespParser;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Accepts connections until `shutdown` resolves.
///
/// Connections already being served keep running on their own tasks; only
/// accepting stops.
pub async fn serve(
    listener: TcpListener,
    command_handler: CommandHandler,
    parser: RespParser,
    stats: Arc<ConnectionStats>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::select! {
        _ = accept_loop(listener, command_handler, parser, Arc::clone(&stats)) => {}
        _ = shutdown => {
            info!("Shutdown signal received, no longer accepting connections");
        }
    }

    stats.log_totals();
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    command_handler: CommandHandler,
    parser: RespParser,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = command_handler.clone();
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, parser, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RespValue;
    use crate::storage::Store;
    use bytes::Bytes;
    use std::net::SocketAddr;
    use std::sync::atomic::Ordering;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn create_test_server() -> (SocketAddr, Arc<Store>, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(Store::new());
        let stats = Arc::new(ConnectionStats::new());

        let handler = CommandHandler::new(Arc::clone(&store));
        let stats_clone = Arc::clone(&stats);
        tokio::spawn(serve(
            listener,
            handler,
            RespParser::new(),
            stats_clone,
            std::future::pending(),
        ));

        (addr, store, stats)
    }

    /// Reads until exactly `len` bytes have arrived.
    async fn read_exact(client: &mut TcpStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        client.read_exact(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_literal_scenario() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(b"*2\r\n$4\r\nPING\r\n$5\r\nhello\r\n")
            .await
            .unwrap();
        assert_eq!(read_exact(&mut client, 8).await, b"+hello\r\n");

        client
            .write_all(b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n")
            .await
            .unwrap();
        assert_eq!(read_exact(&mut client, 5).await, b"+OK\r\n");

        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n")
            .await
            .unwrap();
        assert_eq!(read_exact(&mut client, 7).await, b"$1\r\n1\r\n");
    }

    #[tokio::test]
    async fn test_clients_share_store() {
        let (addr, store, _) = create_test_server().await;

        let mut writer = TcpStream::connect(addr).await.unwrap();
        writer
            .write_all(b"*4\r\n$4\r\nHSET\r\n$4\r\nuser\r\n$4\r\nname\r\n$4\r\nblue\r\n")
            .await
            .unwrap();
        assert_eq!(read_exact(&mut writer, 5).await, b"+OK\r\n");

        let mut reader = TcpStream::connect(addr).await.unwrap();
        reader
            .write_all(b"*3\r\n$4\r\nHGET\r\n$4\r\nuser\r\n$4\r\nname\r\n")
            .await
            .unwrap();
        assert_eq!(read_exact(&mut reader, 10).await, b"$4\r\nblue\r\n");

        assert_eq!(store.hget(b"user", b"name"), Some(Bytes::from("blue")));
    }

    #[tokio::test]
    async fn test_concurrent_clients_lose_no_writes() {
        let (addr, store, _) = create_test_server().await;

        let mut tasks = Vec::new();
        for client_id in 0..8 {
            tasks.push(tokio::spawn(async move {
                let mut client = TcpStream::connect(addr).await.unwrap();
                for i in 0..25 {
                    let key = format!("k{}-{}", client_id, i);
                    let request = encode_command(&["SET", &key, "v"]);
                    client.write_all(&request).await.unwrap();
                    assert_eq!(read_exact(&mut client, 5).await, b"+OK\r\n");
                }
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.len(), 200);
    }

    #[tokio::test]
    async fn test_protocol_error_drops_connection() {
        let (addr, _, stats) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"&nope\r\n").await.unwrap();

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let handler = CommandHandler::new(Arc::new(Store::new()));
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(
            listener,
            handler,
            RespParser::new(),
            Arc::new(ConnectionStats::new()),
            async move {
                let _ = rx.await;
            },
        ));

        tx.send(()).unwrap();
        tokio::time::timeout(tokio::time::Duration::from_secs(2), server)
            .await
            .expect("server did not stop")
            .unwrap();
    }

    /// Encodes a command the way a client library would.
    fn encode_command(parts: &[&str]) -> Vec<u8> {
        RespValue::array(
            parts
                .iter()
                .map(|p| RespValue::bulk_string(Bytes::from(p.to_string())))
                .collect(),
        )
        .serialize()
    }
}
