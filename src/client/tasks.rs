//! Client Cache Tasks
//!
//! Keeps a [`ClientCache`] up to date in the background: one task applies
//! broadcast receipts, another sweeps expired entries on a fixed interval.
//! Cache writes hit storage synchronously, so both tasks run them on the
//! blocking pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::broadcast::Subscription;
use crate::client::ClientCache;

/// Floor applied to the sweep interval; `tokio::time::interval` rejects zero.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Owns the background tasks attached to a client cache.
///
/// Dropping the handle tears the tasks down.
#[derive(Debug, Default)]
pub struct CacheHandle {
    subscription: Option<JoinHandle<()>>,
    sweep: Option<JoinHandle<()>>,
}

impl CacheHandle {
    /// Starts both tasks. Only events named `event` are applied.
    pub fn attach(
        cache: Arc<ClientCache>,
        subscription: Subscription,
        event: impl Into<String>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            subscription: Some(spawn_subscription_task(cache.clone(), subscription, event.into())),
            sweep: Some(spawn_sweep_task(cache, sweep_interval)),
        }
    }

    /// Starts only the sweep, for a cache with no broadcast subscription.
    pub fn sweeping(cache: Arc<ClientCache>, sweep_interval: Duration) -> Self {
        Self {
            subscription: None,
            sweep: Some(spawn_sweep_task(cache, sweep_interval)),
        }
    }

    /// True while at least one task is still running.
    pub fn is_active(&self) -> bool {
        [&self.subscription, &self.sweep]
            .into_iter()
            .flatten()
            .any(|handle| !handle.is_finished())
    }

    /// Stops the subscription and the sweep. Safe to call more than once.
    pub fn teardown(&mut self) {
        let mut stopped = false;
        for handle in [self.subscription.take(), self.sweep.take()].into_iter().flatten() {
            handle.abort();
            stopped = true;
        }
        if stopped {
            info!("Client cache tasks stopped");
        }
    }
}

impl Drop for CacheHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Applies every matching broadcast to the cache until the channel closes.
///
/// A lagging receiver has missed events; those messages are still reachable
/// through a fallback fetch, so the task just carries on.
pub fn spawn_subscription_task(
    cache: Arc<ClientCache>,
    mut subscription: Subscription,
    event: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(received) if received.event == event => {
                    let cache = cache.clone();
                    let payload = received.payload;
                    let id = payload.id.clone();
                    match task::spawn_blocking(move || cache.record_broadcast(&payload)).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(err)) => warn!("Failed to cache broadcast {}: {}", id, err),
                        Err(err) => warn!("Cache write for broadcast {} aborted: {}", id, err),
                    }
                }
                Ok(received) => debug!("Ignoring event {}", received.event),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Broadcast subscription lagged, missed {} events", missed)
                }
                Err(RecvError::Closed) => {
                    info!("Broadcast channel closed");
                    break;
                }
            }
        }
    })
}

/// Sweeps expired entries every `sweep_interval`, independent of any single
/// entry's expiry. Intervals below [`MIN_SWEEP_INTERVAL`] are raised to it.
pub fn spawn_sweep_task(cache: Arc<ClientCache>, sweep_interval: Duration) -> JoinHandle<()> {
    if sweep_interval < MIN_SWEEP_INTERVAL {
        warn!(
            "Client sweep interval {:?} too short, using {:?}",
            sweep_interval, MIN_SWEEP_INTERVAL
        );
    }
    let sweep_interval = sweep_interval.max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        // First tick completes immediately; open() already swept
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let cache = cache.clone();
            match task::spawn_blocking(move || cache.sweep()).await {
                Ok(Ok(0)) => debug!("Client sweep: no expired messages"),
                Ok(Ok(removed)) => info!("Client sweep: removed {} expired messages", removed),
                Ok(Err(err)) => warn!("Client sweep failed: {}", err),
                Err(err) => warn!("Client sweep aborted: {}", err),
            }
        }
    })
}
