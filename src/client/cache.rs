//! Client Cache Module
//!
//! Local reflection of recently seen messages. Filled by broadcast receipt or
//! by a fallback fetch, and expired by a periodic sweep. Every mutation is a
//! load / modify / save of the whole persisted slot.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::broadcast::BroadcastPayload;
use crate::client::storage::{CacheSnapshot, CacheStorage, CachedMessage};
use crate::clock::{self, Clock};
use crate::error::{RelayError, Result};

// == Client Cache ==
pub struct ClientCache {
    storage: Arc<dyn CacheStorage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    /// Serializes read-modify-write cycles within this process
    write_guard: Mutex<()>,
}

impl ClientCache {
    // == Open ==
    /// Opens the cache, dropping anything already expired and persisting the
    /// filtered result.
    pub fn open(
        storage: Arc<dyn CacheStorage>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Result<Self> {
        let cache = Self {
            storage,
            clock,
            ttl,
            write_guard: Mutex::new(()),
        };
        let purged = cache.sweep()?;
        if purged > 0 {
            info!("Dropped {} expired messages on load", purged);
        }
        Ok(cache)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_guard
            .lock()
            .map_err(|_| RelayError::Storage("client cache lock poisoned".to_string()))
    }

    fn is_fresh(&self, entry: &CachedMessage, now: u64) -> bool {
        !clock::is_expired(entry.timestamp, now, self.ttl)
    }

    // == Upsert ==
    /// Stamps the message with the current time and stores it, replacing any
    /// entry with the same id.
    fn upsert(&self, id: &str, message: &str) -> Result<CachedMessage> {
        let _guard = self.lock()?;
        let entry = CachedMessage::new(id, message, self.clock.now_ms());

        let mut snapshot = self.storage.load()?;
        snapshot.insert(id.to_string(), entry.clone());
        self.storage.save(&snapshot)?;

        debug!("Cached message {}", id);
        Ok(entry)
    }

    // == Record Broadcast ==
    /// Handles a broadcast receipt. Duplicate deliveries just re-stamp the entry.
    pub fn record_broadcast(&self, payload: &BroadcastPayload) -> Result<CachedMessage> {
        self.upsert(&payload.id, &payload.message)
    }

    // == Upsert From Fetch ==
    /// Stores a message obtained by fallback fetch. The timestamp is the fetch
    /// time, not the server's receive time.
    pub fn upsert_from_fetch(&self, id: &str, message: &str) -> Result<CachedMessage> {
        self.upsert(id, message)
    }

    // == Fresh ==
    /// Returns the unexpired entry for `id`, if any.
    pub fn fresh(&self, id: &str) -> Result<Option<CachedMessage>> {
        let now = self.clock.now_ms();
        let mut snapshot = self.storage.load()?;
        Ok(snapshot
            .remove(id)
            .filter(|entry| self.is_fresh(entry, now)))
    }

    // == Sweep ==
    /// Removes every expired entry and persists the result.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> Result<usize> {
        let _guard = self.lock()?;
        let now = self.clock.now_ms();

        let snapshot = self.storage.load()?;
        let before = snapshot.len();
        let kept: CacheSnapshot = snapshot
            .into_iter()
            .filter(|(_, entry)| self.is_fresh(entry, now))
            .collect();
        let removed = before - kept.len();

        self.storage.save(&kept)?;
        Ok(removed)
    }

    /// All unexpired entries, ordered by id.
    pub fn entries(&self) -> Result<Vec<CachedMessage>> {
        let now = self.clock.now_ms();
        Ok(self
            .storage
            .load()?
            .into_values()
            .filter(|entry| self.is_fresh(entry, now))
            .collect())
    }

    /// Watches persisted revisions, one per saved mutation.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.storage.subscribe()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("clock", &self.clock)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
