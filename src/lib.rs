//! Pokecache - An in-memory, time-bounded byte cache
//!
//! Stores opaque payloads under string keys (typically resource URLs) so that
//! identical network fetches can be skipped. Every entry lives for a fixed TTL;
//! a background reaper removes stale entries once per TTL interval.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, ExpiringCache};
pub use config::Config;
pub use error::{CacheError, Result};
