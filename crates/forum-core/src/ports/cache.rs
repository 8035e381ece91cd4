use std::time::Duration;

use async_trait::async_trait;

/// String key/value store used to keep rendered list pages.
///
/// Reads never fail: a backend that cannot answer reports a miss, so callers
/// fall through to the database.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value`; `None` keeps it until deleted.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> bool;

    /// Remove every key beginning with `prefix` and report how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Add one to the counter at `key`, creating it at zero first, and
    /// return the result. Counters have no expiry.
    async fn increment(&self, key: &str) -> Result<i64, CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unreachable: {0}")]
    Connection(String),

    #[error("cache entry could not be encoded: {0}")]
    Serialization(String),

    #[error("cache command failed: {0}")]
    Operation(String),
}
