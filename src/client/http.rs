//! HTTP client for the relay API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::client::MessageFetcher;
use crate::error::{RelayError, Result};
use crate::models::{ErrorResponse, MessageResponse, SendMessageRequest, SendResponse};
use crate::validation::{validate_id, validate_message};

/// Talks to `POST {base}/trigger-message` and `GET {base}/messages/:id`.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    /// `base_url` includes the `/api` prefix. Every request gives up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a message. Input is validated before anything goes on the wire.
    pub async fn send_message(&self, id: &str, message: &str) -> Result<SendResponse> {
        validate_message(message)?;
        validate_id(id)?;

        let response = self
            .client
            .post(format!("{}/trigger-message", self.base_url))
            .json(&SendMessageRequest::new(id, message))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<SendResponse>().await?),
            StatusCode::BAD_REQUEST => {
                let body = response.json::<ErrorResponse>().await?;
                Err(RelayError::Validation(body.error))
            }
            status => Err(RelayError::Transport(format!(
                "send failed with status {}",
                status
            ))),
        }
    }

    /// Looks a message up on the server. `Ok(None)` on 404.
    pub async fn fetch_message(&self, id: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/messages/{}", self.base_url, id))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let messages = response.json::<Vec<MessageResponse>>().await?;
                Ok(messages.into_iter().next().map(|m| m.message))
            }
            status => Err(RelayError::Transport(format!(
                "lookup failed with status {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl MessageFetcher for RelayClient {
    async fn fetch(&self, id: &str) -> Result<Option<String>> {
        self.fetch_message(id).await
    }
}
