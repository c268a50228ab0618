//! Ephemeral Relay - short-lived messages shared by id
//!
//! A client posts a message under an id; the server keeps it for five minutes
//! and broadcasts it to subscribers. Clients look messages up through a local
//! cache that falls back to the server.

pub mod api;
pub mod broadcast;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;
pub mod validation;

pub use api::AppState;
pub use config::{ClientConfig, ServerConfig};
pub use error::{RelayError, Result};
pub use tasks::spawn_expiry_task;
