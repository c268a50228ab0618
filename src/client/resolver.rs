//! Lookup Resolver
//!
//! Single entry point for "find the message for this id": prefers the client
//! cache and falls back to the server.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::client::ClientCache;
use crate::error::Result;
use crate::validation::validate_id;

/// Fetches a message from the server store.
#[async_trait]
pub trait MessageFetcher: Send + Sync {
    /// `Ok(None)` when the server has no such message. Anything that prevents
    /// an answer is a `RelayError::Transport`.
    async fn fetch(&self, id: &str) -> Result<Option<String>>;
}

/// Where a resolved message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub id: String,
    pub message: String,
    pub source: LookupSource,
}

pub struct LookupResolver<F> {
    cache: Arc<ClientCache>,
    fetcher: F,
}

impl<F: MessageFetcher> LookupResolver<F> {
    pub fn new(cache: Arc<ClientCache>, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &Arc<ClientCache> {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolves `id` to a message.
    ///
    /// A fresh cache entry is returned without touching the network. On a miss
    /// the server is asked once; a hit is cached with a new timestamp, a
    /// not-found is not cached. Failing to cache a fetched message is logged
    /// and the message is still returned.
    pub async fn resolve(&self, id: &str) -> Result<Option<Resolved>> {
        validate_id(id)?;

        if let Some(entry) = self.cache.fresh(id)? {
            debug!("Cache hit for {}", id);
            return Ok(Some(Resolved {
                id: entry.id,
                message: entry.message,
                source: LookupSource::Cache,
            }));
        }

        debug!("Cache miss for {}, fetching", id);
        match self.fetcher.fetch(id).await? {
            Some(message) => {
                if let Err(err) = self.cache.upsert_from_fetch(id, &message) {
                    warn!("Fetched message {} but could not cache it: {}", id, err);
                }
                Ok(Some(Resolved {
                    id: id.to_string(),
                    message,
                    source: LookupSource::Server,
                }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CacheSnapshot, CacheStorage, MemoryStorage};
    use crate::clock::ManualClock;
    use crate::error::RelayError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(300);

    /// Server stand-in that counts fetches.
    #[derive(Default)]
    struct CountingFetcher {
        messages: HashMap<String, String>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn with(id: &str, message: &str) -> Self {
            let mut fetcher = Self::default();
            fetcher.messages.insert(id.to_string(), message.to_string());
            fetcher
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageFetcher for CountingFetcher {
        async fn fetch(&self, id: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RelayError::Transport("connection refused".to_string()));
            }
            Ok(self.messages.get(id).cloned())
        }
    }

    fn resolver(fetcher: CountingFetcher) -> (LookupResolver<CountingFetcher>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let cache =
            ClientCache::open(Arc::new(MemoryStorage::new()), Arc::new(clock.clone()), TTL)
                .unwrap();
        (LookupResolver::new(Arc::new(cache), fetcher), clock)
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let (resolver, _) = resolver(CountingFetcher::default());
        resolver.cache().upsert_from_fetch("abc", "cached").unwrap();

        let resolved = resolver.resolve("abc").await.unwrap().unwrap();

        assert_eq!(resolved.message, "cached");
        assert_eq!(resolved.source, LookupSource::Cache);
        assert_eq!(resolver.fetcher().calls(), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_once_and_caches() {
        let (resolver, clock) = resolver(CountingFetcher::with("abc", "from server"));
        clock.advance(Duration::from_secs(3));

        let resolved = resolver.resolve("abc").await.unwrap().unwrap();
        assert_eq!(resolved.source, LookupSource::Server);
        assert_eq!(resolver.fetcher().calls(), 1);

        let cached = resolver.cache().fresh("abc").unwrap().unwrap();
        assert_eq!(cached.timestamp, 1_003_000);

        // Second lookup is served locally
        let again = resolver.resolve("abc").await.unwrap().unwrap();
        assert_eq!(again.source, LookupSource::Cache);
        assert_eq!(resolver.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let (resolver, clock) = resolver(CountingFetcher::with("abc", "from server"));
        resolver.cache().upsert_from_fetch("abc", "old copy").unwrap();

        clock.advance(TTL);
        let resolved = resolver.resolve("abc").await.unwrap().unwrap();

        assert_eq!(resolved.message, "from server");
        assert_eq!(resolver.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let (resolver, _) = resolver(CountingFetcher::default());

        assert!(resolver.resolve("zzz").await.unwrap().is_none());
        assert!(resolver.resolve("zzz").await.unwrap().is_none());

        assert_eq!(resolver.fetcher().calls(), 2);
        assert!(resolver.cache().entries().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct_from_not_found() {
        let fetcher = CountingFetcher {
            fail: true,
            ..Default::default()
        };
        let (resolver, _) = resolver(fetcher);

        let result = resolver.resolve("abc").await;
        assert!(matches!(result, Err(RelayError::Transport(_))));
    }

    /// Accepts writes until `read_only` is set.
    #[derive(Default)]
    struct ReadOnlyStorage {
        inner: MemoryStorage,
        read_only: AtomicBool,
    }

    impl CacheStorage for ReadOnlyStorage {
        fn load(&self) -> Result<CacheSnapshot> {
            self.inner.load()
        }

        fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
            if self.read_only.load(Ordering::SeqCst) {
                return Err(RelayError::Storage("disk full".to_string()));
            }
            self.inner.save(snapshot)
        }

        fn subscribe(&self) -> tokio::sync::watch::Receiver<u64> {
            self.inner.subscribe()
        }
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_fetched_message() {
        let storage = Arc::new(ReadOnlyStorage::default());
        let cache = ClientCache::open(storage.clone(), Arc::new(ManualClock::new(0)), TTL).unwrap();
        storage.read_only.store(true, Ordering::SeqCst);

        let resolver = LookupResolver::new(Arc::new(cache), CountingFetcher::with("abc", "hello"));
        let resolved = resolver.resolve("abc").await.unwrap().unwrap();

        assert_eq!(resolved.message, "hello");
        assert_eq!(resolved.source, LookupSource::Server);
        assert!(resolver.cache().fresh("abc").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_id_never_fetches() {
        let (resolver, _) = resolver(CountingFetcher::default());

        for id in ["", "a b", "a-b", "a_b"] {
            let result = resolver.resolve(id).await;
            assert!(matches!(result, Err(RelayError::Validation(_))), "id {:?}", id);
        }
        assert_eq!(resolver.fetcher().calls(), 0);
    }
}
