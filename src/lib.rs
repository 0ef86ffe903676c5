//! Transcript Collector - extract course transcripts from a live document.
//!
//! This library walks a dynamically rendered course (sections of ordered
//! items, each item optionally exposing a transcript panel) and forwards each
//! extracted transcript to a remote collector over a persistent WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  query / subscribe / click  ┌──────────────────┐
//! │ Document     │◄────────────────────────────│ TraversalEngine  │
//! │ (rendering   │                             │  ConditionWaiter │
//! │  environment)│─────── change notices ─────►│                  │
//! └──────────────┘                             └────────┬─────────┘
//!                                                       │ save_transcript
//!                                                       ▼
//!                                              ┌──────────────────┐
//!                                              │ CollectorClient  │──► collector
//!                                              └──────────────────┘
//! ```
//!
//! Key design principles:
//!
//! - The document is never owned; every step re-reads it
//! - Waiting is condition-driven (no fixed delays), bounded by timeouts
//! - Requests are correlated by `messageId`, never by arrival order
//! - One unit in flight at a time, in document order
//!
//! # Quick Start
//!
//! ```ignore
//! use transcript_collector::{CollectorConfig, MemoryDocument, Result, collect_current_section};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = CollectorConfig::from_file("collector.json")?;
//!     let document = MemoryDocument::new(); // or any `Document` implementation
//!
//!     let report = collect_current_section(&document, &config).await?;
//!     println!("{}: {} sent", report.section_title, report.sent());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Endpoint, timeouts, retry policy and selectors |
//! | [`document`] | Rendering-environment interface and [`MemoryDocument`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Collector wire messages |
//! | [`transport`] | WebSocket client and reference collector server |
//! | [`traversal`] | Section walk and run entry point |
//! | [`waiter`] | Condition-driven waiting on the document |

// ============================================================================
// Modules
// ============================================================================

/// Collector configuration.
pub mod config;

/// Rendering-environment interface.
///
/// Implement [`Document`] to drive a real environment; [`MemoryDocument`]
/// is the in-process implementation.
pub mod document;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for correlation ids and document nodes.
pub mod identifiers;

/// Collector wire protocol.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

/// Section traversal.
pub mod traversal;

/// Condition-driven waiting.
pub mod waiter;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{CollectorConfig, SelectorTable, Timeouts};

// Document types
pub use document::{ChangeKind, ChangeNotice, Document, ElementSpec, MemoryDocument, Scope};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{MessageId, NodeId};

// Protocol types
pub use protocol::{Heading, Reply, Request, TranscriptUnit};

// Transport types
pub use transport::{CollectorClient, CollectorServer, ConnectionState, ServerHandle};

// Traversal types
pub use traversal::{
    ItemOutcome, ItemReport, SectionInfo, SectionReport, TraversalEngine, collect_current_section,
};

// Waiter types
pub use waiter::{Condition, ConditionWaiter, WaitOptions};
