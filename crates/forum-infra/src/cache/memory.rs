//! Process-local cache, used when no Redis is configured or reachable.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use forum_core::ports::{Cache, CacheError};

struct Entry {
    value: String,
    deadline: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            deadline: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| now <= deadline)
    }
}

/// Map of entries behind an async lock. Nothing survives a restart and
/// nothing is shared with other instances.
///
/// Expired entries are skipped on read and swept on the next write.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sweep(entries: &mut HashMap<String, Entry>) {
    let now = Instant::now();
    entries.retain(|_, entry| entry.live(now));
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        sweep(&mut entries);
        entries.insert(key.to_owned(), Entry::new(value.to_owned(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        sweep(&mut entries);
        let matching: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in &matching {
            entries.remove(key);
        }
        Ok(matching.len() as u64)
    }

    async fn increment(&self, key: &str) -> Result<i64, CacheError> {
        let mut entries = self.entries.write().await;
        sweep(&mut entries);

        let next = match entries.get(key) {
            None => 1,
            Some(entry) => {
                let current: i64 = entry.value.parse().map_err(|_| {
                    CacheError::Operation(format!("'{key}' does not hold an integer"))
                })?;
                current + 1
            }
        };

        entries.insert(key.to_owned(), Entry::new(next.to_string(), None));
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        cache.delete("key1").await.unwrap();
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();
        cache
            .set("short", "lived", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!cache.exists("short").await);
    }

    #[tokio::test]
    async fn test_delete_prefix_only_touches_matching_keys() {
        let cache = InMemoryCache::new();
        cache.set("topics:0:a", "1", None).await.unwrap();
        cache.set("topics:0:b", "2", None).await.unwrap();
        cache.set("topics_generation", "0", None).await.unwrap();

        let removed = cache.delete_prefix("topics:").await.unwrap();

        assert_eq!(removed, 2);
        assert!(cache.exists("topics_generation").await);
        assert!(!cache.exists("topics:0:a").await);
    }

    #[tokio::test]
    async fn test_increment() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.increment("counter").await.unwrap(), 1);
        assert_eq!(cache.increment("counter").await.unwrap(), 2);

        cache.set("text", "abc", None).await.unwrap();
        assert!(cache.increment("text").await.is_err());
    }
}
