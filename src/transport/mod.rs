//! WebSocket transport layer.
//!
//! This module carries transcript units from the collector client to the
//! remote collector.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌──────────────────┐
//! │ TraversalEngine  │                              │ Collector        │
//! │                  │         WebSocket            │                  │
//! │ CollectorClient  │─────────────────────────────►│ CollectorServer  │
//! │  (Connector)     │◄─────────────────────────────│  (or external)   │
//! └──────────────────┘   save_transcript / reply    └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `CollectorClient::connect` - Dial with bounded retries and backoff
//! 2. `CollectorClient::send_with_response` - Correlated request/response
//! 3. `CollectorClient::close` - Release the socket (idempotent)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | How a socket is opened |
//! | `connection` | Client state machine and event loop |
//! | `server` | Reference collector endpoint |

// ============================================================================
// Submodules
// ============================================================================

/// Client state machine and event loop.
pub mod connection;

/// Socket dialing.
pub mod connector;

/// Reference collector endpoint.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{CollectorClient, ConnectionState};
pub use connector::{Connector, WsConnector, WsStream};
pub use server::{CollectorServer, ServerHandle};
