//! Reaper Task
//!
//! Background task that periodically removes stale cache entries.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns the reaper on `runtime`.
///
/// Every `interval` the task locks the store, removes entries older than the
/// store's TTL and releases the lock. It stops when `shutdown` carries `true`
/// or when its sender is dropped.
///
/// # Arguments
/// * `store` - Shared store, the same mutex `add`/`get` use
/// * `interval` - Time between passes; must be non-zero
/// * `shutdown` - Receiving side of the cache's shutdown signal
///
/// # Returns
/// A JoinHandle that resolves once the loop has exited.
///
/// # Example
/// ```ignore
/// let store = Arc::new(Mutex::new(CacheStore::new(ttl)));
/// let (tx, rx) = watch::channel(false);
/// let handle = spawn_reaper(&Handle::current(), store, ttl, rx);
/// // Later, during teardown:
/// tx.send(true).ok();
/// handle.await.ok();
/// ```
pub fn spawn_reaper(
    runtime: &Handle,
    store: Arc<Mutex<CacheStore>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!("Starting reaper with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; the first pass runs one interval in
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let (removed, remaining) = {
                        let mut guard = store.lock();
                        let removed = guard.reap_stale(Instant::now());
                        (removed, guard.len())
                    };

                    if removed > 0 {
                        info!("Reaper: removed {} stale entries, {} remaining", removed, remaining);
                    } else {
                        debug!("Reaper: no stale entries found");
                    }
                }
                changed = shutdown.changed() => {
                    // Err means every sender is gone
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reaper stopped");
    })
}
