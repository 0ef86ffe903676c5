//! Selectors for the structural elements of a course document.
//!
//! Selectors are opaque strings handed to the
//! [`Document`](crate::document::Document); their syntax is whatever the
//! rendering environment understands (CSS for a browser).

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// SelectorTable
// ============================================================================

/// Fixed table of selectors and attribute names used during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    /// Section containers, in document order.
    pub section: String,

    /// Items, queried within a section.
    pub item: String,

    /// Control that reveals the transcript panel.
    pub transcript_toggle: String,

    /// One line of transcript text.
    pub transcript_text: String,

    /// Section title, queried within a section.
    pub section_title: String,

    /// Item title, queried within an item.
    pub item_title: String,

    /// Control that navigates to the next item.
    pub next_item: String,

    /// Control that expands a section, queried within the section.
    pub expand_toggle: String,

    /// Attribute reporting whether a section is expanded (`"true"`/`"false"`).
    pub expanded_attribute: String,

    /// Attribute marking the current item (`"true"`).
    pub current_attribute: String,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            section: "div[data-purpose='curriculum-section-container'] \
                      div[data-purpose^='section-panel']"
                .to_string(),
            item: "li[class^='curriculum-item-link--curriculum-item--']".to_string(),
            transcript_toggle: "button[data-purpose='transcript-toggle']".to_string(),
            transcript_text: "span[data-purpose='cue-text']".to_string(),
            section_title: ".ud-accordion-panel-title".to_string(),
            item_title: "span[data-purpose='item-title']".to_string(),
            next_item: "#go-to-next-item".to_string(),
            expand_toggle: "button.ud-btn.js-panel-toggler".to_string(),
            expanded_attribute: "aria-expanded".to_string(),
            current_attribute: "aria-current".to_string(),
        }
    }
}

impl SelectorTable {
    /// Returns every entry paired with its name.
    fn named(&self) -> [(&'static str, &str); 10] {
        [
            ("section", self.section.as_str()),
            ("item", self.item.as_str()),
            ("transcript_toggle", self.transcript_toggle.as_str()),
            ("transcript_text", self.transcript_text.as_str()),
            ("section_title", self.section_title.as_str()),
            ("item_title", self.item_title.as_str()),
            ("next_item", self.next_item.as_str()),
            ("expand_toggle", self.expand_toggle.as_str()),
            ("expanded_attribute", self.expanded_attribute.as_str()),
            ("current_attribute", self.current_attribute.as_str()),
        ]
    }

    /// Rejects blank entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first blank entry.
    pub fn validate(&self) -> Result<()> {
        match self
            .named()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            Some((name, _)) => Err(Error::config(format!("selector {name} must not be empty"))),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SelectorTable::default().validate().is_ok());
    }

    #[test]
    fn test_blank_entry_rejected() {
        let table = SelectorTable {
            next_item: "  ".to_string(),
            ..SelectorTable::default()
        };
        let err = table.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: selector next_item must not be empty"
        );
    }

    #[test]
    fn test_partial_json_override() {
        let table: SelectorTable = serde_json::from_str(r#"{"item": "li.lecture"}"#).unwrap();
        assert_eq!(table.item, "li.lecture");
        assert_eq!(table.next_item, "#go-to-next-item");
    }
}
