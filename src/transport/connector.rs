//! Socket dialing.
//!
//! [`Connector`] is the seam between the client's retry policy and the
//! actual handshake, so the policy can be exercised without a network.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Connector
// ============================================================================

/// Opens one WebSocket connection.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Performs a single connection attempt to `endpoint`.
    async fn open(&self, endpoint: &str) -> Result<WsStream>;
}

// ============================================================================
// WsConnector
// ============================================================================

/// Dials with `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, endpoint: &str) -> Result<WsStream> {
        let (stream, response) = tokio_tungstenite::connect_async(endpoint).await?;
        debug!(endpoint, status = %response.status(), "WebSocket handshake completed");
        Ok(stream)
    }
}
