//! Collector configuration.
//!
//! Every option has a default, so an empty configuration is valid.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use transcript_collector::CollectorConfig;
//!
//! let config = CollectorConfig::default()
//!     .with_endpoint("ws://127.0.0.1:9000")
//!     .with_max_retries(5)
//!     .with_retry_base_delay(Duration::from_millis(500));
//! config.validate()?;
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `options` | [`CollectorConfig`] and [`Timeouts`] |
//! | `selectors` | [`SelectorTable`] for locating structural elements |

// ============================================================================
// Submodules
// ============================================================================

/// Endpoint, timeouts and retry policy.
pub mod options;

/// Structural selectors.
pub mod selectors;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::{CollectorConfig, Timeouts};
pub use selectors::SelectorTable;
