//! Error types for the transcript collector.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use transcript_collector::{Result, Error};
//!
//! async fn example(client: &CollectorClient) -> Result<()> {
//!     client.connect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Observation | [`Error::TriggerFailed`], [`Error::Timeout`], [`Error::Document`] |
//! | Connection | [`Error::ConnectionFailed`], [`Error::NotConnected`], [`Error::ConnectionClosed`] |
//! | Dispatch | [`Error::ResponseTimeout`], [`Error::Protocol`] |
//! | Traversal | [`Error::InvalidSection`], [`Error::NavigationUnavailable`], [`Error::NavigationTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::MessageId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a loaded or built configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Observation Errors
    // ========================================================================
    /// The triggering action of a wait could not be invoked.
    ///
    /// No observation is attempted when this is returned.
    #[error("Failed to trigger {node}: {message}")]
    TriggerFailed {
        /// Node the trigger was aimed at.
        node: String,
        /// Description of the failure.
        message: String,
    },

    /// Condition not satisfied in time.
    #[error("Timeout after {timeout_ms}ms waiting for {selector}")]
    Timeout {
        /// Selector that was being observed.
        selector: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The rendering environment rejected an operation.
    #[error("Document error: {message}")]
    Document {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// All connect attempts were exhausted.
    #[error("Failed to connect to {endpoint} after {attempts} attempts")]
    ConnectionFailed {
        /// Endpoint that was dialed.
        endpoint: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// A send was attempted while the connection is not open.
    #[error("Connection is not open")]
    NotConnected,

    /// Connection closed while a request was outstanding.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// No correlated response arrived in time.
    #[error("Response {message_id} timed out after {timeout_ms}ms")]
    ResponseTimeout {
        /// Correlation id of the unanswered request.
        message_id: MessageId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Protocol violation or malformed payload.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Traversal Errors
    // ========================================================================
    /// Section index out of range.
    #[error("Invalid section index {index} (document has {count} sections)")]
    InvalidSection {
        /// Requested index.
        index: usize,
        /// Number of sections present at validation time.
        count: usize,
    },

    /// No next-item control is present.
    #[error("Next item control not found: {selector}")]
    NavigationUnavailable {
        /// Selector of the next-item control.
        selector: String,
    },

    /// The next-item control did not change after being triggered.
    #[error("Navigation did not complete within {timeout_ms}ms")]
    NavigationTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a trigger failure.
    #[inline]
    pub fn trigger_failed(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TriggerFailed {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Creates a wait timeout error.
    #[inline]
    pub fn timeout(selector: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            selector: selector.into(),
            timeout_ms,
        }
    }

    /// Creates a document error.
    #[inline]
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }

    /// Creates a connection failure after exhausted retries.
    #[inline]
    pub fn connection_failed(endpoint: impl Into<String>, attempts: u32) -> Self {
        Self::ConnectionFailed {
            endpoint: endpoint.into(),
            attempts,
        }
    }

    /// Creates a response timeout error.
    #[inline]
    pub fn response_timeout(message_id: MessageId, timeout_ms: u64) -> Self {
        Self::ResponseTimeout {
            message_id,
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid section error.
    #[inline]
    pub fn invalid_section(index: usize, count: usize) -> Self {
        Self::InvalidSection { index, count }
    }

    /// Creates a navigation unavailable error.
    #[inline]
    pub fn navigation_unavailable(selector: impl Into<String>) -> Self {
        Self::NavigationUnavailable {
            selector: selector.into(),
        }
    }

    /// Creates a navigation timeout error.
    #[inline]
    pub fn navigation_timeout(timeout_ms: u64) -> Self {
        Self::NavigationTimeout { timeout_ms }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ResponseTimeout { .. } | Self::NavigationTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::NotConnected
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error ends traversal of a section.
    #[inline]
    #[must_use]
    pub fn is_navigation_error(&self) -> bool {
        matches!(
            self,
            Self::NavigationUnavailable { .. } | Self::NavigationTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
