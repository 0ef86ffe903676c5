//! Endpoint, timeout and retry configuration.
//!
//! Durations are expressed in milliseconds when loaded from JSON:
//!
//! ```json
//! {
//!   "endpoint": "ws://localhost:8765",
//!   "timeouts": { "connect": 5000, "response": 5000 },
//!   "max_retries": 3
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

use super::SelectorTable;

// ============================================================================
// Constants
// ============================================================================

/// Default collector endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

/// Default number of connect attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff unit between connect attempts.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

// ============================================================================
// Timeouts
// ============================================================================

/// Per-operation timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Waiting for the connection to report itself open, per attempt.
    #[serde(with = "millis")]
    pub connect: Duration,

    /// Generic element wait (section expansion, current-item confirmation).
    #[serde(with = "millis")]
    pub element_wait: Duration,

    /// Locating transcript-reveal controls.
    #[serde(with = "millis")]
    pub transcript_reveal: Duration,

    /// Waiting for the next-item control to be replaced after navigation.
    #[serde(with = "millis")]
    pub navigation: Duration,

    /// Waiting for transcript text lines to appear once revealed.
    #[serde(with = "millis")]
    pub transcript_text: Duration,

    /// Waiting for a correlated response from the collector.
    #[serde(with = "millis")]
    pub response: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(5000),
            element_wait: Duration::from_millis(2000),
            transcript_reveal: Duration::from_millis(3000),
            navigation: Duration::from_millis(7000),
            transcript_text: Duration::from_millis(10000),
            response: Duration::from_millis(5000),
        }
    }
}

impl Timeouts {
    /// Returns every timeout paired with its name.
    fn named(&self) -> [(&'static str, Duration); 6] {
        [
            ("connect", self.connect),
            ("element_wait", self.element_wait),
            ("transcript_reveal", self.transcript_reveal),
            ("navigation", self.navigation),
            ("transcript_text", self.transcript_text),
            ("response", self.response),
        ]
    }
}

// ============================================================================
// CollectorConfig
// ============================================================================

/// Top-level configuration for a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// WebSocket address of the remote collector.
    pub endpoint: String,

    /// Per-operation timeouts.
    pub timeouts: Timeouts,

    /// Total connect attempts before giving up.
    pub max_retries: u32,

    /// Backoff unit; the delay after attempt `n` is `n` times this.
    #[serde(with = "millis")]
    pub retry_base_delay: Duration,

    /// Selectors for the structural elements of the document.
    pub selectors: SelectorTable,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeouts: Timeouts::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            selectors: SelectorTable::default(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl CollectorConfig {
    /// Parses a configuration from JSON; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not valid JSON for this shape
    /// - [`Error::Config`] if the result fails [`validate`](Self::validate)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl CollectorConfig {
    /// Sets the collector endpoint.
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replaces all timeouts.
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the total number of connect attempts.
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff unit between connect attempts.
    #[inline]
    #[must_use]
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Replaces the selector table.
    #[inline]
    #[must_use]
    pub fn with_selectors(mut self, selectors: SelectorTable) -> Self {
        self.selectors = selectors;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl CollectorConfig {
    /// Checks the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the endpoint is not a `ws`/`wss` URL,
    /// `max_retries` is zero, or any timeout is zero.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| Error::config(format!("invalid endpoint {:?}: {e}", self.endpoint)))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "endpoint must use ws:// or wss://, got {}://",
                url.scheme()
            )));
        }

        if self.max_retries == 0 {
            return Err(Error::config("max_retries must be at least 1"));
        }

        if let Some((name, _)) = self
            .timeouts
            .named()
            .into_iter()
            .find(|(_, value)| value.is_zero())
        {
            return Err(Error::config(format!("timeout {name} must be non-zero")));
        }

        self.selectors.validate()
    }
}

// ============================================================================
// Serde Helpers
// ============================================================================

/// (De)serializes a [`Duration`] as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
