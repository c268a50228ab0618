//! Broadcast Module
//!
//! Fire-and-forget notification of stored messages to subscribed clients.
//! The rest of the relay only assumes delivery "usually arrives": nothing
//! here acknowledges, orders or retries.

mod local;
mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use local::{BroadcastEvent, LocalChannel, Subscription};
pub use webhook::WebhookBroadcaster;

/// Default channel name
pub const DEFAULT_CHANNEL: &str = "my-channel";

/// Default event name
pub const DEFAULT_EVENT: &str = "my-event";

// == Payload ==
/// What subscribers receive for every stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastPayload {
    pub id: String,
    pub message: String,
}

impl BroadcastPayload {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

// == Broadcaster ==
/// Publish capability injected into the server.
///
/// Failures surface as `RelayError::Transport`.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Sends `payload` under `event` to every current subscriber.
    async fn publish(&self, event: &str, payload: &BroadcastPayload) -> Result<()>;
}
