//! Request DTOs for the relay API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RelayError, Result};
use crate::validation::{validate_id, validate_message, NON_ALPHANUMERIC_ID};

/// Returned when either field is missing or blank
pub const REQUIRED_FIELDS: &str = "Message and ID are required";

/// Request body for POST /api/trigger-message
///
/// Both fields default to empty, whether absent or `null`, so a missing field
/// is reported as a 400 rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// The message text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    /// Caller-chosen alphanumeric id
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SendMessageRequest {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: id.into(),
        }
    }

    /// Validates the request data
    pub fn validate(&self) -> Result<()> {
        if validate_message(&self.message).is_err() || self.id.trim().is_empty() {
            return Err(RelayError::Validation(REQUIRED_FIELDS.to_string()));
        }
        validate_id(&self.id)
            .map_err(|_| RelayError::Validation(NON_ALPHANUMERIC_ID.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_text(req: &SendMessageRequest) -> Option<String> {
        match req.validate() {
            Ok(()) => None,
            Err(RelayError::Validation(msg)) => Some(msg),
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_send_request_deserialize() {
        let json = r#"{"message": "hello", "id": "abc123"}"#;
        let req: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.id, "abc123");
        assert_eq!(req.message, "hello");
    }

    #[test]
    fn test_send_request_missing_field_defaults() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"message": "hello"}"#).unwrap();
        assert!(req.id.is_empty());
        assert_eq!(validation_text(&req).as_deref(), Some(REQUIRED_FIELDS));
    }

    #[test]
    fn test_send_request_null_fields_default() {
        for json in [
            r#"{"message": null, "id": "abc"}"#,
            r#"{"message": "hi", "id": null}"#,
        ] {
            let req: SendMessageRequest = serde_json::from_str(json).unwrap();
            assert_eq!(validation_text(&req).as_deref(), Some(REQUIRED_FIELDS), "{}", json);
        }
    }

    #[test]
    fn test_validate_blank_message() {
        let req = SendMessageRequest::new("abc", "   ");
        assert_eq!(validation_text(&req).as_deref(), Some(REQUIRED_FIELDS));
    }

    #[test]
    fn test_validate_non_alphanumeric_id() {
        let req = SendMessageRequest::new("abc-123", "hello");
        assert_eq!(validation_text(&req).as_deref(), Some(NON_ALPHANUMERIC_ID));
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SendMessageRequest::new("abc123", "hello");
        assert!(validation_text(&req).is_none());
    }
}
