//! Inbound reply type.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::MessageId;

use super::MESSAGE_ID_KEY;

// ============================================================================
// Constants
// ============================================================================

/// Status reported for an accepted request.
pub const STATUS_SUCCESS: &str = "success";

/// Status reported for a rejected request.
pub const STATUS_ERROR: &str = "error";

// ============================================================================
// Reply
// ============================================================================

/// A reply from the collector.
///
/// Any JSON object is a valid reply; only `messageId` matters for
/// correlation. `status` and `message` are read when they are strings;
/// values of any other type stay in [`extra`](Self::extra).
///
/// # Format
///
/// ```json
/// {
///   "status": "success",
///   "message": "Data received and queued",
///   "messageId": "3f0c..."
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reply {
    /// Echoed correlation id.
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,

    /// `"success"` or `"error"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Remaining fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reply {
    /// Converts a decoded JSON object into a reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut extra) = value else {
            return Err(Error::protocol("reply is not a JSON object"));
        };

        Ok(Self {
            message_id: take_string(&mut extra, MESSAGE_ID_KEY).map(MessageId::new),
            status: take_string(&mut extra, "status"),
            message: take_string(&mut extra, "message"),
            extra,
        })
    }

    /// Acknowledgement for a queued unit.
    #[must_use]
    pub fn queued(message_id: Option<MessageId>) -> Self {
        Self {
            message_id,
            status: Some(STATUS_SUCCESS.to_string()),
            message: Some("Data received and queued".to_string()),
            extra: Map::new(),
        }
    }

    /// Rejection with a reason.
    #[must_use]
    pub fn error(message_id: Option<MessageId>, message: impl Into<String>) -> Self {
        Self {
            message_id,
            status: Some(STATUS_ERROR.to_string()),
            message: Some(message.into()),
            extra: Map::new(),
        }
    }

    /// Rejection of a frame that was not valid JSON.
    #[must_use]
    pub fn invalid_json() -> Self {
        Self::error(None, "Invalid JSON format")
    }

    /// Returns `true` if the collector reported success.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// Returns `true` if the collector reported an error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some(STATUS_ERROR)
    }
}

/// Removes `key` from `map` if it holds a string.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        other => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_parse_success_reply() {
        let reply = Reply::from_value(json!({
            "status": "success",
            "message": "Data received and queued",
            "messageId": "abc",
        }))
        .unwrap();

        assert!(reply.is_success());
        assert!(!reply.is_error());
        assert_eq!(reply.message_id, Some(MessageId::new("abc")));
    }

    #[test]
    fn test_parse_arbitrary_object() {
        let reply = Reply::from_value(json!({"messageId": "1", "saved": 3})).unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.extra.get("saved"), Some(&json!(3)));
    }

    #[test]
    fn test_non_string_fields_kept_as_extra() {
        let reply = Reply::from_value(json!({
            "messageId": "7",
            "status": 200,
            "message": {"saved": true},
        }))
        .unwrap();

        assert_eq!(reply.message_id, Some(MessageId::new("7")));
        assert_eq!(reply.status, None);
        assert_eq!(reply.message, None);
        assert!(!reply.is_error());
        assert_eq!(reply.extra.get("status"), Some(&json!(200)));
        assert_eq!(reply.extra.get("message"), Some(&json!({"saved": true})));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Reply::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_invalid_json_reply_format() {
        let value = serde_json::to_value(Reply::invalid_json()).unwrap();
        assert_eq!(
            value,
            json!({"status": "error", "message": "Invalid JSON format"})
        );
    }
}
