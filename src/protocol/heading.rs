//! Section and item title parsing.
//!
//! Course titles usually carry an ordinal: `"Section 3: Getting Started"`,
//! `"12. Installing the toolchain"`. [`Heading`] separates the number from
//! the display name.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

// ============================================================================
// Patterns
// ============================================================================

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("valid regex"));

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.-]").expect("valid regex"));

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.+)").expect("valid regex"));

// ============================================================================
// Heading
// ============================================================================

/// A title split into its ordinal and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Ordinal, if the title carried one.
    pub number: Option<u32>,
    /// Display name.
    pub name: String,
}

impl Heading {
    /// Parses a section title such as `"Section 3: Getting Started"`.
    ///
    /// The number is the first integer anywhere in the title; the name is
    /// the text after the last `:`, with punctuation other than `.` and `-`
    /// removed.
    #[must_use]
    pub fn parse_section(raw: &str) -> Self {
        let number: Option<u32> = FIRST_NUMBER
            .captures(raw)
            .and_then(|caps| caps[1].parse().ok());

        match number {
            Some(number) => {
                let tail = raw.rsplit(':').next().unwrap_or(raw).trim();
                Self {
                    number: Some(number),
                    name: DISALLOWED.replace_all(tail, "").into_owned(),
                }
            }
            None => Self {
                number: None,
                name: raw.trim().to_string(),
            },
        }
    }

    /// Parses an item title such as `"12. Installing the toolchain"`.
    #[must_use]
    pub fn parse_item(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(caps) = NUMBERED_ITEM.captures(trimmed)
            && let Ok(number) = caps[1].parse::<u32>()
        {
            return Self {
                number: Some(number),
                name: caps[2].to_string(),
            };
        }

        Self {
            number: None,
            name: trimmed.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
