//! API Handlers
//!
//! HTTP request handlers for each relay endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::broadcast::{BroadcastPayload, Broadcaster, DEFAULT_EVENT};
use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::error::{RelayError, Result};
use crate::models::{HealthResponse, MessageResponse, SendMessageRequest, SendResponse};
use crate::store::MessageStore;

/// Application state shared across all handlers.
///
/// Holds the message store behind Arc<RwLock<>> and the injected broadcaster.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe message store
    pub store: Arc<RwLock<MessageStore>>,
    /// Where stored messages are announced
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Event name used for every publish
    pub event: String,
    /// Upper bound on a single publish
    pub publish_timeout: Duration,
}

impl AppState {
    /// Creates a new AppState with the given store and broadcaster.
    pub fn new(store: MessageStore, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            broadcaster,
            event: DEFAULT_EVENT.to_string(),
            publish_timeout: Duration::from_secs(10),
        }
    }

    /// Creates a new AppState from configuration, using the system clock.
    pub fn from_config(config: &ServerConfig, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self::with_clock(config, broadcaster, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &ServerConfig,
        broadcaster: Arc<dyn Broadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = MessageStore::new(config.message_ttl(), clock);
        Self {
            event: config.broadcast_event.clone(),
            publish_timeout: config.publish_timeout(),
            ..Self::new(store, broadcaster)
        }
    }

    /// Stores the message, then publishes it.
    ///
    /// The record stays stored whatever happens to the publish. A failed or
    /// timed-out publish is reported as `SendResponse::stored_only`.
    pub async fn send_message(&self, id: &str, message: &str) -> Result<SendResponse> {
        self.store.write().await.put(id, message)?;

        let payload = BroadcastPayload::new(id, message);
        let published = tokio::time::timeout(
            self.publish_timeout,
            self.broadcaster.publish(&self.event, &payload),
        )
        .await
        .unwrap_or_else(|_| {
            Err(RelayError::Transport(format!(
                "publish timed out after {}ms",
                self.publish_timeout.as_millis()
            )))
        });

        match published {
            Ok(()) => {
                info!("Message with ID {} sent", id);
                Ok(SendResponse::sent())
            }
            Err(err) => {
                warn!("Message with ID {} stored but not broadcast: {}", id, err);
                Ok(SendResponse::stored_only())
            }
        }
    }
}

/// Handler for POST /api/trigger-message
///
/// Stores the message and broadcasts it. Responds 200 on full success and
/// 202 when the message was stored but the broadcast failed.
pub async fn send_message_handler(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendResponse>)> {
    req.validate()?;

    let response = state.send_message(&req.id, &req.message).await?;
    let status = if response.is_partial() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(response)))
}

/// Handler for GET /api/messages/:id
///
/// Returns a single-element array with the message, or 404.
pub async fn get_message_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>> {
    // Write lock: reading an expired record removes it
    let mut store = state.store.write().await;
    let record = store.get(&id)?;

    Ok(Json(vec![MessageResponse::from(record)]))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
