//! Traversal results.

// ============================================================================
// ItemOutcome
// ============================================================================

/// What happened to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A unit was sent and acknowledged.
    Sent,
    /// No transcript control appeared.
    NoTranscript,
    /// The transcript had no non-empty lines.
    EmptyTranscript,
    /// The collector acknowledged the unit with an error.
    Rejected(String),
    /// Extraction or dispatch failed.
    Failed(String),
}

impl ItemOutcome {
    /// Returns `true` if a unit was delivered successfully.
    #[inline]
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }

    /// Returns `true` if the item had nothing to send.
    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::NoTranscript | Self::EmptyTranscript)
    }

    /// Returns `true` if the item had content that did not get through.
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Failed(_))
    }
}

// ============================================================================
// ItemReport
// ============================================================================

/// Outcome of one item, with its display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    /// Item display title.
    pub title: String,
    /// What happened.
    pub outcome: ItemOutcome,
}

// ============================================================================
// SectionReport
// ============================================================================

/// Per-item outcomes of one section, in traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    /// Section display title.
    pub section_title: String,
    /// Items visited, starting at the resume point.
    pub items: Vec<ItemReport>,
}

impl SectionReport {
    /// Creates an empty report.
    #[inline]
    #[must_use]
    pub fn new(section_title: impl Into<String>) -> Self {
        Self {
            section_title: section_title.into(),
            items: Vec::new(),
        }
    }

    /// Records an item.
    pub fn push(&mut self, title: impl Into<String>, outcome: ItemOutcome) {
        self.items.push(ItemReport {
            title: title.into(),
            outcome,
        });
    }

    /// Number of units delivered.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_sent()).count()
    }

    /// Number of items without content.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_skipped()).count()
    }

    /// Number of items whose content did not get through.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_failure()).count()
    }

    /// Titles of the items visited.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.title.as_str())
    }
}

// ============================================================================
// SectionInfo
// ============================================================================

/// A section's position and display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    /// Structural index, stable within one run.
    pub index: usize,
    /// Display title.
    pub title: String,
}

// ============================================================================
// Tests
// ============================================================================
