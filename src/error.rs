//! Error types for the relay
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Body of every 500, whichever route produced it
pub const INTERNAL_ERROR: &str = "Something went wrong!";

// == Relay Error Enum ==
/// Unified error type for the server store, broadcast and client cache.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Bad or empty id or message; the caller must correct the input
    #[error("{0}")]
    Validation(String),

    /// Id unknown or expired
    #[error("Message not found: {0}")]
    NotFound(String),

    /// Network or broadcast failure, safe to retry manually
    #[error("Transport error: {0}")]
    Transport(String),

    /// Client cache storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Transport(format!("request timed out: {}", err))
        } else {
            RelayError::Transport(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RelayError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RelayError::NotFound(_) => (StatusCode::NOT_FOUND, "Message not found".to_string()),
            RelayError::Transport(_) => (
                StatusCode::BAD_GATEWAY,
                "Failed to reach broadcast channel".to_string(),
            ),
            RelayError::Storage(_)
            | RelayError::Io(_)
            | RelayError::Serialization(_)
            | RelayError::Internal(_) => {
                tracing::error!("Unexpected failure: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the relay.
pub type Result<T> = std::result::Result<T, RelayError>;
