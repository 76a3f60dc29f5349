//! Expiring Cache Module
//!
//! The shareable cache handle: one mutex-guarded store plus the control side
//! of its reaper task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_reaper;

/// Control side of the reaper task.
///
/// Dropping it drops the shutdown sender, which also ends the task.
#[derive(Debug)]
struct ReaperControl {
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

// == Expiring Cache ==
/// Thread-safe byte cache whose entries are dropped by a background reaper
/// once they are older than the TTL.
///
/// Clones share the same store and reaper. The reaper runs until
/// [`shutdown`](Self::shutdown) or [`close`](Self::close) is called, or until
/// the last clone is dropped.
///
/// Expiry is approximate: the reaper runs once per TTL, so a [`get`](Self::get)
/// can return an entry up to one extra TTL after it nominally expired.
///
/// # Example
/// ```ignore
/// let cache = ExpiringCache::new(Duration::from_secs(300))?;
/// cache.add("https://pokeapi.co/api/v2/location-area/", body);
/// if let Some(hit) = cache.get("https://pokeapi.co/api/v2/location-area/") {
///     // use hit instead of fetching
/// }
/// cache.close().await;
/// ```
#[derive(Debug, Clone)]
pub struct ExpiringCache {
    store: Arc<Mutex<CacheStore>>,
    reaper: Arc<ReaperControl>,
}

impl ExpiringCache {
    // == Constructor ==
    /// Creates an empty cache and starts its reaper with an interval of `ttl`.
    ///
    /// # Errors
    /// - `CacheError::InvalidTtl` if `ttl` is zero
    /// - `CacheError::NoRuntime` if called outside a Tokio runtime
    pub fn new(ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let store = Arc::new(Mutex::new(CacheStore::new(ttl)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = spawn_reaper(&runtime, Arc::clone(&store), ttl, shutdown_rx);
        debug!("Cache created with TTL {:?}", ttl);

        Ok(Self {
            store,
            reaper: Arc::new(ReaperControl {
                shutdown_tx,
                task: Mutex::new(Some(task)),
            }),
        })
    }

    /// Creates a cache from a validated [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(config.ttl())
    }

    // == Add ==
    /// Inserts or overwrites `key`, stamping it with the current time.
    ///
    /// Visible to every `get` that starts after this returns, from any thread.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        let key = key.into();
        let value = value.into();
        trace!(key = %key, len = value.len(), "cache add");
        self.store.lock().insert(key, value);
    }

    // == Get ==
    /// Returns the payload stored under `key`, or `None` on a miss.
    ///
    /// The entry's age is not checked; a present entry is returned even if its
    /// TTL has just elapsed and the reaper has not run yet.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let value = self.store.lock().get(key);
        trace!(key = %key, hit = value.is_some(), "cache get");
        value
    }

    // == Get Or Fetch ==
    /// Returns the cached payload for `key`, or runs `fetch` on a miss and
    /// caches its successful result.
    ///
    /// A failed fetch stores nothing and its error is returned unchanged. The
    /// store lock is not held while `fetch` runs, so two concurrent misses on
    /// the same key may both fetch; the later `add` wins.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
    ) -> std::result::Result<Bytes, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Bytes, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let value = fetch().await?;
        self.add(key, value.clone());
        Ok(value)
    }

    // == TTL ==
    /// Returns the TTL, which is also the reaper interval.
    pub fn ttl(&self) -> Duration {
        self.store.lock().ttl()
    }

    // == Length ==
    /// Returns the number of entries, stale ones not yet reaped included.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    // == Reaper Lifecycle ==
    /// Returns true until the reaper task has exited.
    pub fn is_reaper_running(&self) -> bool {
        self.reaper
            .task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Signals the reaper to stop without waiting for it.
    ///
    /// Idempotent. The cache stays usable, but entries are no longer reaped.
    pub fn shutdown(&self) {
        // send_replace never fails, even if the task already exited
        let was_running = !self.reaper.shutdown_tx.send_replace(true);
        if was_running {
            debug!("Reaper shutdown requested");
        }
    }

    /// Stops the reaper and waits for it to exit.
    pub async fn close(self) {
        self.shutdown();
        let task = self.reaper.task.lock().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!("Reaper task ended abnormally: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_new_rejects_zero_ttl() {
        let result = ExpiringCache::new(Duration::ZERO);
        assert_eq!(result.unwrap_err(), CacheError::InvalidTtl(Duration::ZERO));
    }

    #[test]
    fn test_new_outside_runtime() {
        let result = ExpiringCache::new(TTL);
        assert_eq!(result.unwrap_err(), CacheError::NoRuntime);
    }

    #[tokio::test]
    async fn test_from_config() {
        let cache = ExpiringCache::from_config(&Config::with_ttl_secs(42)).unwrap();
        assert_eq!(cache.ttl(), Duration::from_secs(42));

        let result = ExpiringCache::from_config(&Config::with_ttl_secs(0));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let cache = ExpiringCache::new(TTL).unwrap();

        cache.add("key1", Bytes::from_static(b"value1"));

        assert_eq!(cache.get("key1"), Some(Bytes::from_static(b"value1")));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }

    #[tokio::test]
    async fn test_add_accepts_vec_and_static() {
        let cache = ExpiringCache::new(TTL).unwrap();

        cache.add(String::from("vec"), vec![1u8, 2, 3]);
        cache.add("static", &b"abc"[..]);

        assert_eq!(cache.get("vec").as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(cache.get("static").as_deref(), Some(&b"abc"[..]));
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let cache = ExpiringCache::new(TTL).unwrap();
        let other = cache.clone();

        other.add("shared", Bytes::from_static(b"x"));

        assert_eq!(cache.get("shared"), Some(Bytes::from_static(b"x")));
    }

    #[tokio::test]
    async fn test_stats_track_lookups() {
        let cache = ExpiringCache::new(TTL).unwrap();
        cache.add("key", Bytes::new());

        cache.get("key");
        cache.get("key");
        cache.get("nope");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_miss_then_hit() {
        let cache = ExpiringCache::new(TTL).unwrap();

        let fetched: std::result::Result<Bytes, String> = cache
            .get_or_fetch("url", || async { Ok(Bytes::from_static(b"body")) })
            .await;
        assert_eq!(fetched.unwrap(), Bytes::from_static(b"body"));

        let cached: std::result::Result<Bytes, String> = cache
            .get_or_fetch("url", || async { Err("should not fetch".to_string()) })
            .await;
        assert_eq!(cached.unwrap(), Bytes::from_static(b"body"));
    }

    #[tokio::test]
    async fn test_get_or_fetch_error_caches_nothing() {
        let cache = ExpiringCache::new(TTL).unwrap();

        let result: std::result::Result<Bytes, String> = cache
            .get_or_fetch("url", || async { Err("network down".to_string()) })
            .await;

        assert_eq!(result.unwrap_err(), "network down");
        assert_eq!(cache.get("url"), None);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let cache = ExpiringCache::new(TTL).unwrap();
        assert!(cache.is_reaper_running());

        cache.shutdown();
        cache.shutdown();

        // Still usable after the reaper is told to stop
        cache.add("key", Bytes::from_static(b"v"));
        assert_eq!(cache.get("key"), Some(Bytes::from_static(b"v")));

        cache.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_reaper() {
        let cache = ExpiringCache::new(TTL).unwrap();
        let observer = cache.clone();

        cache.close().await;

        assert!(!observer.is_reaper_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_last_clone_ends_reaper() {
        let cache = ExpiringCache::new(TTL).unwrap();
        let other = cache.clone();
        let store = Arc::clone(&cache.store);
        assert!(Arc::strong_count(&store) > 2);

        drop(cache);
        tokio::task::yield_now().await;
        // One live clone keeps the reaper and its store reference alive
        assert!(other.is_reaper_running());
        assert_eq!(Arc::strong_count(&store), 3);

        drop(other);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        // Only this test's reference is left once the reaper has exited
        assert_eq!(Arc::strong_count(&store), 1);
    }
}
