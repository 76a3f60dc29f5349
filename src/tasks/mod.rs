//! Background Tasks Module
//!
//! Contains the tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Reaper: Removes stale cache entries once per TTL interval

mod reaper;

pub use reaper::spawn_reaper;
