//! Input Validation
//!
//! The id and message validators gate both the send path and the lookup path.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{RelayError, Result};

pub const EMPTY_MESSAGE: &str = "Message cannot be empty.";
pub const EMPTY_ID: &str = "ID cannot be empty.";
pub const NON_ALPHANUMERIC_ID: &str = "ID must be alphanumeric.";

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static id pattern is valid"))
}

/// Fails if the message is empty or all whitespace.
pub fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(RelayError::Validation(EMPTY_MESSAGE.to_string()));
    }
    Ok(())
}

/// Fails if the id is empty, all whitespace, or has anything outside `[A-Za-z0-9]`.
pub fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(RelayError::Validation(EMPTY_ID.to_string()));
    }
    if !id_pattern().is_match(id) {
        return Err(RelayError::Validation(NON_ALPHANUMERIC_ID.to_string()));
    }
    Ok(())
}
