//! Collector wire protocol.
//!
//! Messages are JSON text frames on a WebSocket.
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`Request`] | Client → Collector | `save_transcript` with a [`TranscriptUnit`] |
//! | [`Reply`] | Collector → Client | Acknowledgement echoing `messageId` |
//!
//! The client attaches a fresh `messageId` to every request; only that field
//! of a reply is interpreted for correlation.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | Outbound messages and [`TranscriptUnit`] |
//! | `reply` | Inbound acknowledgements |
//! | `heading` | Section and item title parsing |

// ============================================================================
// Constants
// ============================================================================

/// JSON key carrying the correlation id.
pub const MESSAGE_ID_KEY: &str = "messageId";

// ============================================================================
// Submodules
// ============================================================================

/// Section and item title parsing.
pub mod heading;

/// Inbound reply type.
pub mod reply;

/// Outbound request types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use heading::Heading;
pub use reply::Reply;
pub use request::{Request, TranscriptUnit};
