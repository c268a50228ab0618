//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes messages whose TTL has elapsed at configured intervals

mod expiry;

pub use expiry::spawn_expiry_task;
