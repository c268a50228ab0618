//! Expiry Sweep Task
//!
//! Single background task that removes expired messages from the server store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MessageStore;

/// Spawns a background task that periodically purges expired messages.
///
/// The task sleeps for `sweep_interval` between runs and holds the write lock
/// only for the duration of one purge.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(MessageStore::new(ttl, Arc::new(SystemClock))));
/// let sweep_handle = spawn_expiry_task(store.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_expiry_task(
    store: Arc<RwLock<MessageStore>>,
    sweep_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {}ms",
            sweep_interval.as_millis()
        );

        loop {
            tokio::time::sleep(sweep_interval).await;

            let (removed, remaining) = {
                let mut store_guard = store.write().await;
                let removed = store_guard.purge_expired();
                (removed, store_guard.len())
            };

            if removed > 0 {
                info!(
                    "Expiry sweep: removed {} messages, {} remaining",
                    removed, remaining
                );
            } else {
                debug!("Expiry sweep: no expired messages found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(300);
    const TICK: Duration = Duration::from_millis(20);

    fn shared_store() -> (Arc<RwLock<MessageStore>>, ManualClock) {
        let clock = ManualClock::new(0);
        let store = MessageStore::new(TTL, Arc::new(clock.clone()));
        (Arc::new(RwLock::new(store)), clock)
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_messages() {
        let (store, clock) = shared_store();
        store.write().await.put("expireSoon", "value").unwrap();

        let handle = spawn_expiry_task(store.clone(), TICK);

        clock.advance(TTL + Duration::from_secs(1));
        tokio::time::sleep(TICK * 5).await;

        assert_eq!(store.read().await.len(), 0, "Expired message should have been swept");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_preserves_live_messages() {
        let (store, clock) = shared_store();
        store.write().await.put("longLived", "value").unwrap();

        let handle = spawn_expiry_task(store.clone(), TICK);

        clock.advance(TTL - Duration::from_secs(1));
        tokio::time::sleep(TICK * 5).await;

        let record = store.write().await.get("longLived");
        assert_eq!(record.unwrap().body, "value");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (store, _) = shared_store();

        let handle = spawn_expiry_task(store, TICK);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
