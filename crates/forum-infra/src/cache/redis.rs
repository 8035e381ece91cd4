//! Redis backend of the list cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use forum_core::ports::{Cache, CacheError};

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 200;

const DEFAULT_URL: &str = "redis://localhost:6379";

/// Where and how to reach Redis.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Give up connecting after this long.
    pub connect_timeout: Duration,
    /// Start with the in-memory cache instead of failing when Redis is down.
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Read `REDIS_URL`, `REDIS_CONNECT_TIMEOUT_SECS` and
    /// `REDIS_FALLBACK_TO_MEMORY`, keeping the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let connect_timeout = std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);

        let fallback_to_memory = match std::env::var("REDIS_FALLBACK_TO_MEMORY") {
            Ok(v) => matches!(v.as_str(), "true" | "1"),
            Err(_) => defaults.fallback_to_memory,
        };

        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout,
            fallback_to_memory,
        }
    }
}

/// Cache stored in Redis, shared by every server instance.
///
/// The connection manager reconnects on its own; each call works on a cheap
/// clone of it.
pub struct RedisCache {
    conn: ConnectionManager,
}

fn op_err(e: RedisError) -> CacheError {
    CacheError::Operation(e.to_string())
}

impl RedisCache {
    /// Connect, failing after `connect_timeout` if Redis does not answer.
    pub async fn connect(config: RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let connecting = ConnectionManager::new(client);
        let conn = match tokio::time::timeout(config.connect_timeout, connecting).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(CacheError::Connection(e.to_string())),
            Err(_) => {
                return Err(CacheError::Connection(format!(
                    "no answer from {} within {:?}",
                    config.url, config.connect_timeout
                )));
            }
        };

        tracing::info!(url = %config.url, "Connected to Redis cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Redis GET failed"))
            .ok()
            .flatten()
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            // EX rejects zero; sub-second TTLs round up.
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }

        let mut conn = self.conn.clone();
        let _: () = cmd.query_async(&mut conn).await.map_err(op_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(op_err)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        conn.exists(key).await.unwrap_or(false)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(op_err)?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await.map_err(op_err)?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!(prefix = %prefix, removed, "Redis prefix eviction");
        Ok(removed)
    }

    async fn increment(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1).await.map_err(op_err)
    }
}

/// Escape the glob metacharacters SCAN MATCH understands.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Needs a live Redis at `REDIS_URL`; tests return early without one.
    async fn live_cache() -> Option<RedisCache> {
        let config = RedisConfig {
            connect_timeout: Duration::from_secs(1),
            fallback_to_memory: false,
            ..RedisConfig::from_env()
        };
        RedisCache::connect(config).await.ok()
    }

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("lista_de_topicos:"), "lista_de_topicos:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }

    #[tokio::test]
    async fn test_entry_lifecycle() {
        let Some(cache) = live_cache().await else {
            return;
        };

        cache.set("forum_test:entry", "[1,2]", Some(Duration::from_secs(30))).await.unwrap();
        assert_eq!(cache.get("forum_test:entry").await.as_deref(), Some("[1,2]"));

        cache.delete("forum_test:entry").await.unwrap();
        assert!(!cache.exists("forum_test:entry").await);
    }

    #[tokio::test]
    async fn test_delete_prefix_and_increment() {
        let Some(cache) = live_cache().await else {
            return;
        };

        for key in ["forum_test:1", "forum_test:2", "forum_test_other"] {
            cache.set(key, "x", None).await.unwrap();
        }

        assert_eq!(cache.delete_prefix("forum_test:").await.unwrap(), 2);
        assert!(cache.exists("forum_test_other").await);

        cache.delete("forum_test_counter").await.unwrap();
        assert_eq!(cache.increment("forum_test_counter").await.unwrap(), 1);
        assert_eq!(cache.increment("forum_test_counter").await.unwrap(), 2);

        for key in ["forum_test_other", "forum_test_counter"] {
            cache.delete(key).await.unwrap();
        }
    }
}
