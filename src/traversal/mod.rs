//! Section traversal.
//!
//! Walks one section of a course, item by item, and sends each transcript to
//! the collector.
//!
//! # Per-Item Steps
//!
//! | Step | Wait | On failure |
//! |------|------|------------|
//! | Locate transcript control | `transcript_reveal` | skip item ([`ItemOutcome::NoTranscript`]) |
//! | Reveal transcript text | `transcript_text` | record [`ItemOutcome::Failed`] |
//! | Filter blank lines | none | skip item ([`ItemOutcome::EmptyTranscript`]) |
//! | Send and await reply | `response` | record [`ItemOutcome::Failed`] |
//! | Confirm item is current | `element_wait` | ignored |
//! | Advance to next item | `navigation` | stop section (unless next item is current) |
//!
//! Item problems never stop the section; navigation problems do.

// ============================================================================
// Submodules
// ============================================================================

/// Traversal state machine.
pub mod engine;

/// Run entry point.
pub mod entry;

/// Traversal results.
pub mod report;

#[cfg(test)]
pub(crate) mod fixture;

// ============================================================================
// Re-exports
// ============================================================================

pub use engine::{TraversalEngine, UNKNOWN_ITEM, UNKNOWN_SECTION};
pub use entry::collect_current_section;
pub use report::{ItemOutcome, ItemReport, SectionInfo, SectionReport};
