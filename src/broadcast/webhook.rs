//! HTTP publisher for a hosted broadcast service.
//!
//! Posts each event as `{ "name", "channels", "data" }` where `data` is the
//! JSON-encoded payload, the trigger body hosted pub/sub services accept.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{BroadcastPayload, Broadcaster};
use crate::error::{RelayError, Result};

#[derive(Debug, Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: [&'a str; 1],
    data: String,
}

/// Broadcaster that forwards events to a remote trigger endpoint.
#[derive(Debug, Clone)]
pub struct WebhookBroadcaster {
    client: Client,
    url: String,
    channel: String,
}

impl WebhookBroadcaster {
    /// Builds a publisher whose requests give up after `timeout`.
    pub fn new(
        url: impl Into<String>,
        channel: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            channel: channel.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Broadcaster for WebhookBroadcaster {
    async fn publish(&self, event: &str, payload: &BroadcastPayload) -> Result<()> {
        let body = TriggerBody {
            name: event,
            channels: [self.channel.as_str()],
            data: serde_json::to_string(payload)?,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Transport(format!(
                "broadcast endpoint returned {}",
                status
            )));
        }

        debug!("Triggered {} on {} for {}", event, self.channel, payload.id);
        Ok(())
    }
}
