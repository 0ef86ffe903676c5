//! Outbound request types.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::Heading;

// ============================================================================
// TranscriptUnit
// ============================================================================

/// One item's extracted transcript with its section and item titles.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptUnit {
    section: String,
    title: String,
    transcripts: Vec<String>,
}

impl TranscriptUnit {
    /// Creates a unit from already-filtered, non-empty lines.
    #[must_use]
    pub fn new(
        section_title: impl Into<String>,
        item_title: impl Into<String>,
        lines: Vec<String>,
    ) -> Self {
        Self {
            section: section_title.into(),
            title: item_title.into(),
            transcripts: lines,
        }
    }

    /// Returns the section display title.
    #[inline]
    #[must_use]
    pub fn section_title(&self) -> &str {
        &self.section
    }

    /// Returns the item display title.
    #[inline]
    #[must_use]
    pub fn item_title(&self) -> &str {
        &self.title
    }

    /// Returns the transcript lines in document order.
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.transcripts
    }

    /// Parses the section title into number and name.
    #[must_use]
    pub fn section_heading(&self) -> Heading {
        Heading::parse_section(&self.section)
    }

    /// Parses the item title into number and name.
    #[must_use]
    pub fn item_heading(&self) -> Heading {
        Heading::parse_item(&self.title)
    }
}

// ============================================================================
// Request
// ============================================================================

/// A request from the client to the collector.
///
/// # Format
///
/// ```json
/// {
///   "action": "save_transcript",
///   "section": "Section 1: Intro",
///   "title": "1. Welcome",
///   "transcripts": ["Hi", "Bye"]
/// }
/// ```
///
/// The `messageId` field is added by the client at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Persist one transcript unit.
    SaveTranscript(TranscriptUnit),
}

// ============================================================================
// Tests
// ============================================================================
