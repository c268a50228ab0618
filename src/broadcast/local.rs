//! In-process broadcast channel backed by `tokio::sync::broadcast`.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use super::{BroadcastPayload, Broadcaster};
use crate::error::Result;

/// Buffered events per subscriber before it starts lagging
const CHANNEL_CAPACITY: usize = 256;

/// A published event as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEvent {
    pub channel: String,
    pub event: String,
    pub payload: BroadcastPayload,
}

/// Receiving end of a channel subscription. Dropping it unsubscribes.
pub type Subscription = broadcast::Receiver<BroadcastEvent>;

/// Named pub/sub channel living inside the process.
#[derive(Debug, Clone)]
pub struct LocalChannel {
    name: String,
    sender: broadcast::Sender<BroadcastEvent>,
}

impl LocalChannel {
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts receiving every event published after this call.
    pub fn subscribe(&self) -> Subscription {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl Broadcaster for LocalChannel {
    async fn publish(&self, event: &str, payload: &BroadcastPayload) -> Result<()> {
        let event = BroadcastEvent {
            channel: self.name.clone(),
            event: event.to_string(),
            payload: payload.clone(),
        };

        match self.sender.send(event) {
            Ok(delivered) => debug!("Broadcast {} to {} subscribers", payload.id, delivered),
            // Nobody listening is not a failure
            Err(_) => debug!("Broadcast {} had no subscribers", payload.id),
        }
        Ok(())
    }
}
