//! Message Store Module
//!
//! Server-side holder of active messages. Records live in a HashMap keyed by
//! id; an expiry index drives the background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{RelayError, Result};
use crate::store::{ExpiryIndex, MessageRecord};
use crate::validation::{validate_id, validate_message};

// == Message Store ==
/// Authoritative in-memory store for sent messages.
#[derive(Debug)]
pub struct MessageStore {
    /// Live records by id
    records: HashMap<String, MessageRecord>,
    /// Expiry order, may contain stale entries for overwritten ids
    expiry: ExpiryIndex,
    /// How long a record stays retrievable after it is stored
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MessageStore {
    // == Constructor ==
    /// Creates an empty store whose records live for `ttl`.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: HashMap::new(),
            expiry: ExpiryIndex::new(),
            ttl,
            clock,
        }
    }

    // == Put ==
    /// Stores a message under `id`, replacing any previous one.
    ///
    /// The expiration window starts now, so re-putting an id restarts it.
    pub fn put(&mut self, id: &str, body: &str) -> Result<MessageRecord> {
        validate_id(id)?;
        validate_message(body)?;

        let now = self.clock.now_ms();
        let record = MessageRecord::new(id, body, now);
        let replaced = self.records.insert(id.to_string(), record.clone()).is_some();
        self.expiry.schedule(id, record.expires_at(self.ttl));

        if replaced {
            info!("Message with ID {} replaced", id);
        } else {
            info!("Message with ID {} stored", id);
        }
        Ok(record)
    }

    // == Get ==
    /// Returns the live record for `id`.
    ///
    /// A record past its TTL that the sweep has not reached yet is removed
    /// here and reported as not found.
    pub fn get(&mut self, id: &str) -> Result<MessageRecord> {
        let now = self.clock.now_ms();
        match self.records.get(id) {
            Some(record) if record.is_expired(now, self.ttl) => {
                self.records.remove(id);
                info!("Message with ID {} expired", id);
                Err(RelayError::NotFound(id.to_string()))
            }
            Some(record) => Ok(record.clone()),
            None => Err(RelayError::NotFound(id.to_string())),
        }
    }

    // == Purge Expired ==
    /// Removes every record whose TTL has elapsed.
    ///
    /// Only index entries that are due are visited. An entry left behind by an
    /// overwrite is discarded without touching the newer record.
    ///
    /// Returns the number of records removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;

        while let Some((_, id)) = self.expiry.pop_due(now) {
            let expired = self
                .records
                .get(&id)
                .map(|record| record.is_expired(now, self.ttl))
                .unwrap_or(false);

            if expired {
                self.records.remove(&id);
                info!("Message with ID {} deleted after expiry", id);
                removed += 1;
            } else {
                debug!("Skipping stale expiry entry for {}", id);
            }
        }

        removed
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Length ==
    /// Number of records held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of pending expiry entries, stale ones included.
    pub fn pending_expiries(&self) -> usize {
        self.expiry.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(300);

    fn test_store() -> (MessageStore, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        (MessageStore::new(TTL, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_store_new() {
        let (store, _) = test_store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_put_and_get() {
        let (mut store, _) = test_store();

        store.put("abc123", "hello").unwrap();
        let record = store.get("abc123").unwrap();

        assert_eq!(record.body, "hello");
        assert_eq!(record.received_at, 1_000_000);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = test_store();
        assert!(matches!(store.get("zzz"), Err(RelayError::NotFound(_))));
    }

    #[test]
    fn test_store_rejects_invalid_input() {
        let (mut store, _) = test_store();

        assert!(matches!(store.put("", "hello"), Err(RelayError::Validation(_))));
        assert!(matches!(store.put("abc", "   "), Err(RelayError::Validation(_))));
        assert!(matches!(store.put("a-b", "hello"), Err(RelayError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_overwrite_replaces_body() {
        let (mut store, _) = test_store();

        store.put("abc", "first").unwrap();
        store.put("abc", "second").unwrap();

        assert_eq!(store.get("abc").unwrap().body, "second");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_after_ttl() {
        let (mut store, clock) = test_store();

        store.put("abc", "hello").unwrap();
        clock.advance(TTL - Duration::from_millis(1));
        assert!(store.get("abc").is_ok());

        clock.advance(Duration::from_millis(1));
        assert!(matches!(store.get("abc"), Err(RelayError::NotFound(_))));
        assert!(store.is_empty(), "Expired record is dropped on read");
    }

    #[test]
    fn test_store_purge_expired() {
        let (mut store, clock) = test_store();

        store.put("old", "one").unwrap();
        clock.advance(Duration::from_secs(200));
        store.put("young", "two").unwrap();
        clock.advance(Duration::from_secs(101));

        let removed = store.purge_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("young").is_ok());
    }

    #[test]
    fn test_overwrite_is_not_deleted_by_stale_expiry() {
        let (mut store, clock) = test_store();

        store.put("abc", "first").unwrap();
        clock.advance(Duration::from_secs(240));
        store.put("abc", "second").unwrap();

        // First window is over, second has 240s left
        clock.advance(Duration::from_secs(61));
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.get("abc").unwrap().body, "second");
        assert_eq!(store.pending_expiries(), 1);

        clock.advance(Duration::from_secs(240));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_skips_records_already_dropped_on_read() {
        let (mut store, clock) = test_store();

        store.put("abc", "hello").unwrap();
        clock.advance(TTL);
        assert!(store.get("abc").is_err());

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.pending_expiries(), 0);
    }
}
