//! API Module
//!
//! HTTP handlers and routing for the relay REST API.
//!
//! # Endpoints
//! - `POST /api/trigger-message` - Store and broadcast a message
//! - `GET /api/messages/:id` - Look up a stored message
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, create_router_with_cors};
