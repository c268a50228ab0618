//! Message Record Module
//!
//! A single stored message with the time it was received.

use std::time::Duration;

use crate::clock;

// == Message Record ==
/// A message held by the server store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Caller-chosen alphanumeric key
    pub id: String,
    /// The message payload
    pub body: String,
    /// When this record was stored (Unix milliseconds)
    pub received_at: u64,
}

impl MessageRecord {
    // == Constructor ==
    pub fn new(id: impl Into<String>, body: impl Into<String>, received_at: u64) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            received_at,
        }
    }

    // == Expires At ==
    /// Instant (Unix milliseconds) at which the record stops being retrievable.
    pub fn expires_at(&self, ttl: Duration) -> u64 {
        self.received_at.saturating_add(ttl.as_millis() as u64)
    }

    // == Is Expired ==
    /// Boundary inclusive: a record is expired once the full TTL has elapsed.
    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        clock::is_expired(self.received_at, now_ms, ttl)
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64, ttl: Duration) -> u64 {
        self.expires_at(ttl).saturating_sub(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_record_creation() {
        let record = MessageRecord::new("abc123", "hello", 1_000);
        assert_eq!(record.id, "abc123");
        assert_eq!(record.body, "hello");
        assert_eq!(record.expires_at(TTL), 301_000);
    }

    #[test]
    fn test_record_expiration() {
        let record = MessageRecord::new("abc123", "hello", 0);
        assert!(!record.is_expired(299_999, TTL));
        assert!(record.is_expired(300_000, TTL));
    }

    #[test]
    fn test_ttl_remaining() {
        let record = MessageRecord::new("abc123", "hello", 0);
        assert_eq!(record.ttl_remaining_ms(100_000, TTL), 200_000);
        assert_eq!(record.ttl_remaining_ms(400_000, TTL), 0);
    }
}
