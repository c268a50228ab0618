//! Response DTOs for the relay API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::store::MessageRecord;

/// Body of a full success from POST /api/trigger-message
pub const MESSAGE_SENT: &str = "Message sent";

/// Body of a partial success: stored but not broadcast
pub const MESSAGE_STORED: &str = "Message stored";

pub const BROADCAST_FAILED_WARNING: &str =
    "Broadcast failed; message is available by direct lookup";

/// Response body for POST /api/trigger-message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    /// Success message
    pub success: String,
    /// Set when the message was stored but the broadcast did not go out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SendResponse {
    /// Stored and broadcast
    pub fn sent() -> Self {
        Self {
            success: MESSAGE_SENT.to_string(),
            warning: None,
        }
    }

    /// Stored, broadcast failed
    pub fn stored_only() -> Self {
        Self {
            success: MESSAGE_STORED.to_string(),
            warning: Some(BROADCAST_FAILED_WARNING.to_string()),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.warning.is_some()
    }
}

/// One element of the GET /api/messages/:id response array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub id: String,
}

impl From<MessageRecord> for MessageResponse {
    fn from(record: MessageRecord) -> Self {
        Self {
            message: record.body,
            id: record.id,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
