//! Configuration Module
//!
//! Handles loading server and client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::broadcast::{DEFAULT_CHANNEL, DEFAULT_EVENT};
use crate::store::MESSAGE_TTL_SECS;

/// Optional env file read before the process environment
pub const ENV_FILE: &str = "config.env";

/// Loads `config.env` into the environment if present. Variables already set win.
pub fn load_env_file() -> bool {
    dotenvy::from_filename(ENV_FILE).is_ok()
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server port
    pub server_port: u16,
    /// Seconds a message stays retrievable
    pub message_ttl: u64,
    /// Seconds between expiry sweeps
    pub sweep_interval: u64,
    /// Broadcast channel name
    pub broadcast_channel: String,
    /// Broadcast event name
    pub broadcast_event: String,
    /// Seconds before a publish attempt is abandoned
    pub publish_timeout: u64,
    /// Hosted broadcast trigger URL; None keeps broadcasts in-process
    pub broadcast_webhook_url: Option<String>,
    /// Single allowed CORS origin; None allows any
    pub cors_allowed_origin: Option<String>,
}

impl ServerConfig {
    /// Creates a new ServerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 3001)
    /// - `MESSAGE_TTL_SECS` - Message lifetime in seconds (default: 300)
    /// - `SWEEP_INTERVAL_SECS` - Expiry sweep frequency in seconds (default: 1)
    /// - `BROADCAST_CHANNEL` - Channel name (default: my-channel)
    /// - `BROADCAST_EVENT` - Event name (default: my-event)
    /// - `PUBLISH_TIMEOUT_SECS` - Publish timeout in seconds (default: 10)
    /// - `BROADCAST_WEBHOOK_URL` - Hosted trigger endpoint (default: unset)
    /// - `CORS_ALLOWED_ORIGIN` - Only origin allowed by CORS (default: any)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("PORT", defaults.server_port),
            message_ttl: env_or("MESSAGE_TTL_SECS", defaults.message_ttl),
            sweep_interval: env_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            broadcast_channel: env_or("BROADCAST_CHANNEL", defaults.broadcast_channel),
            broadcast_event: env_or("BROADCAST_EVENT", defaults.broadcast_event),
            publish_timeout: env_or("PUBLISH_TIMEOUT_SECS", defaults.publish_timeout),
            broadcast_webhook_url: env_opt("BROADCAST_WEBHOOK_URL"),
            cors_allowed_origin: env_opt("CORS_ALLOWED_ORIGIN"),
        }
    }

    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(self.message_ttl)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout)
    }

    /// Never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            message_ttl: MESSAGE_TTL_SECS,
            sweep_interval: 1,
            broadcast_channel: DEFAULT_CHANNEL.to_string(),
            broadcast_event: DEFAULT_EVENT.to_string(),
            publish_timeout: 10,
            broadcast_webhook_url: None,
            cors_allowed_origin: None,
        }
    }
}

/// Client configuration parameters.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the relay API, including the `/api` prefix
    pub api_url: String,
    /// File holding the persisted client cache
    pub cache_path: PathBuf,
    /// Seconds between client cache sweeps
    pub sweep_interval: u64,
    /// Seconds before a fetch is abandoned
    pub fetch_timeout: u64,
    /// Seconds a cached message stays usable
    pub message_ttl: u64,
}

impl ClientConfig {
    /// Creates a new ClientConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `RELAY_API_URL` - API base URL (default: http://localhost:3001/api)
    /// - `RELAY_CACHE_PATH` - Cache file (default: messages.json)
    /// - `CLIENT_SWEEP_INTERVAL_SECS` - Cache sweep frequency (default: 60)
    /// - `FETCH_TIMEOUT_SECS` - Request timeout (default: 10)
    /// - `MESSAGE_TTL_SECS` - Cached message lifetime (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env_or("RELAY_API_URL", defaults.api_url),
            cache_path: env_or("RELAY_CACHE_PATH", defaults.cache_path),
            sweep_interval: env_or("CLIENT_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            fetch_timeout: env_or("FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            message_ttl: env_or("MESSAGE_TTL_SECS", defaults.message_ttl),
        }
    }

    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(self.message_ttl)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    /// Never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/api".to_string(),
            cache_path: PathBuf::from("messages.json"),
            sweep_interval: 60,
            fetch_timeout: 10,
            message_ttl: MESSAGE_TTL_SECS,
        }
    }
}
