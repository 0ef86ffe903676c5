//! Reference collector server.
//!
//! A minimal receiving side for the collector protocol. Each accepted
//! `save_transcript` request is forwarded to an in-process queue and
//! acknowledged; persistence is left to whoever drains the queue.
//!
//! # Frame Handling
//!
//! | Incoming frame | Action | Reply |
//! |----------------|--------|-------|
//! | Not JSON | none | `{"status":"error","message":"Invalid JSON format"}` |
//! | `save_transcript` | queue unit | `{"status":"success","message":"Data received and queued","messageId":..}` |
//! | `save_transcript`, bad fields | none | `{"status":"error",..,"messageId":..}` |
//! | Any other action | none | none |

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::identifiers::MessageId;
use crate::protocol::{MESSAGE_ID_KEY, Reply, TranscriptUnit};

// ============================================================================
// Constants
// ============================================================================

/// Action name of a transcript submission.
const SAVE_TRANSCRIPT: &str = "save_transcript";

// ============================================================================
// CollectorServer
// ============================================================================

/// A collector server that is bound but not yet serving.
///
/// # Example
///
/// ```ignore
/// let server = CollectorServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 8765).await?;
/// let (handle, mut units) = server.spawn();
///
/// while let Some(unit) = units.recv().await {
///     println!("{} / {}", unit.section_title(), unit.item_title());
/// }
/// ```
pub struct CollectorServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Address the listener is bound to.
    local_addr: SocketAddr,
}

impl CollectorServer {
    /// Binds to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let local_addr = listener.local_addr()?;

        debug!(%local_addr, "Collector server bound");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port())
    }

    /// Returns the address the server is bound to.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting clients in a background task.
    ///
    /// Returns a handle that stops the server and the receiving end of the
    /// transcript queue. Units are queued in arrival order per client.
    #[must_use]
    pub fn spawn(self) -> (ServerHandle, mpsc::UnboundedReceiver<TranscriptUnit>) {
        let (unit_tx, unit_rx) = mpsc::unbounded_channel();
        let port = self.port();

        info!(addr = %self.local_addr, "Collector server listening");

        let task = tokio::spawn(Self::accept_loop(self.listener, unit_tx));

        (ServerHandle { port, task }, unit_rx)
    }

    /// Accepts clients until aborted; each client gets its own task.
    async fn accept_loop(listener: TcpListener, unit_tx: mpsc::UnboundedSender<TranscriptUnit>) {
        let mut clients = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!(?addr, "TCP connection accepted");
                            clients.spawn(Self::serve_client(stream, addr, unit_tx.clone()));
                        }
                        Err(e) => {
                            warn!(error = %e, "Accept failed");
                        }
                    }
                }

                Some(_) = clients.join_next(), if !clients.is_empty() => {}
            }
        }
    }

    /// Serves one client until it disconnects.
    async fn serve_client(
        stream: TcpStream,
        addr: SocketAddr,
        unit_tx: mpsc::UnboundedSender<TranscriptUnit>,
    ) {
        let mut ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(?addr, error = %e, "WebSocket upgrade failed");
                return;
            }
        };

        info!(?addr, "Client connected");

        while let Some(message) = ws.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!(?addr, error = %e, "WebSocket error");
                    break;
                }
            };

            let Some(reply) = handle_frame(&text, &unit_tx) else {
                continue;
            };

            let encoded = match serde_json::to_string(&reply) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(error = %e, "Failed to encode reply");
                    continue;
                }
            };

            if let Err(e) = ws.send(Message::Text(encoded.into())).await {
                warn!(?addr, error = %e, "Failed to send reply");
                break;
            }
        }

        info!(?addr, "Client disconnected");
    }
}

// ============================================================================
// ServerHandle
// ============================================================================

/// Handle to a running [`CollectorServer`].
pub struct ServerHandle {
    port: u16,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL for this server.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Stops accepting and drops every client connection.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Frame Handling
// ============================================================================

/// Handles one text frame and returns the reply to send, if any.
fn handle_frame(text: &str, unit_tx: &mpsc::UnboundedSender<TranscriptUnit>) -> Option<Reply> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => {
            warn!("Received invalid JSON");
            return Some(Reply::invalid_json());
        }
    };

    let message_id = value
        .get(MESSAGE_ID_KEY)
        .and_then(Value::as_str)
        .map(MessageId::new);

    let action = value.get("action").and_then(Value::as_str);
    if action != Some(SAVE_TRANSCRIPT) {
        debug!(?action, "Ignoring unsupported action");
        return None;
    }

    let unit: TranscriptUnit = match serde_json::from_value(value) {
        Ok(unit) => unit,
        Err(e) => {
            warn!(error = %e, "Malformed transcript payload");
            return Some(Reply::error(
                message_id,
                format!("Invalid transcript payload: {e}"),
            ));
        }
    };

    let section = unit.section_heading();
    let item = unit.item_heading();
    info!(
        section_number = ?section.number,
        section = %section.name,
        item_number = ?item.number,
        item = %item.name,
        lines = unit.lines().len(),
        "Transcript received"
    );

    if unit_tx.send(unit).is_err() {
        warn!("Transcript queue closed");
        return Some(Reply::error(message_id, "Transcript queue closed"));
    }

    Some(Reply::queued(message_id))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;

    async fn spawn_server() -> (ServerHandle, mpsc::UnboundedReceiver<TranscriptUnit>) {
        CollectorServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed")
            .spawn()
    }

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let server = CollectorServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        assert!(server.port() > 0);
        assert_eq!(server.ws_url(), format!("ws://127.0.0.1:{}", server.port()));
        assert_eq!(server.local_addr().port(), server.port());
    }

    #[tokio::test]
    async fn test_local_addr_reports_bound_ip() {
        let server = CollectorServer::bind(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
            .await
            .expect("bind should succeed");

        assert_eq!(server.local_addr().ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(server.local_addr().port(), server.port());
    }

    #[test]
    fn test_handle_frame_queues_unit() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let frame = json!({
            "action": "save_transcript",
            "section": "Section 1: Intro",
            "title": "1. Welcome",
            "transcripts": ["Hi"],
            "messageId": "m-1",
        });

        let reply = handle_frame(&frame.to_string(), &tx).unwrap();

        assert!(reply.is_success());
        assert_eq!(reply.message_id, Some(MessageId::new("m-1")));
        assert_eq!(reply.message.as_deref(), Some("Data received and queued"));
        assert_eq!(rx.try_recv().unwrap().item_title(), "1. Welcome");
    }

    #[test]
    fn test_handle_frame_invalid_json() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reply = handle_frame("{not json", &tx).unwrap();

        assert!(reply.is_error());
        assert_eq!(reply.message.as_deref(), Some("Invalid JSON format"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_handle_frame_ignores_other_actions() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let frame = json!({"action": "ping", "messageId": "m-2"});
        assert!(handle_frame(&frame.to_string(), &tx).is_none());
    }

    #[test]
    fn test_handle_frame_rejects_malformed_unit() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let frame = json!({"action": "save_transcript", "messageId": "m-3", "title": 5});

        let reply = handle_frame(&frame.to_string(), &tx).unwrap();

        assert!(reply.is_error());
        assert_eq!(reply.message_id, Some(MessageId::new("m-3")));
    }

    #[tokio::test]
    async fn test_round_trip_over_socket() {
        let (handle, mut units) = spawn_server().await;
        let (mut ws, _) = connect_async(handle.ws_url()).await.unwrap();

        let frame = json!({
            "action": "save_transcript",
            "section": "Intro",
            "title": "A",
            "transcripts": ["Hi", "Bye"],
            "messageId": "abc",
        });
        ws.send(Message::Text(frame.to_string().into())).await.unwrap();

        let reply = timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let reply: Value = serde_json::from_str(reply.to_text().unwrap()).unwrap();
        assert_eq!(
            reply,
            json!({
                "status": "success",
                "message": "Data received and queued",
                "messageId": "abc",
            })
        );

        let unit = units.recv().await.unwrap();
        assert_eq!(unit.lines(), ["Hi".to_string(), "Bye".to_string()]);

        handle.shutdown();
    }
}
