//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Only construction and
//! configuration can fail; `add` and `get` are infallible.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// TTL must be a positive duration
    #[error("Invalid TTL: {0:?} (must be greater than zero)")]
    InvalidTtl(Duration),

    /// The reaper needs a Tokio runtime to be spawned on
    #[error("No Tokio runtime available to spawn the reaper task")]
    NoRuntime,

    /// Configuration value rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
