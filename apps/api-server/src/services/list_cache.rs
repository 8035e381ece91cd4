//! Cache of topic list pages.
//!
//! Every entry key embeds the current generation of the list cache. Evicting
//! bumps the generation before deleting the stored pages, so a page computed
//! concurrently with a mutation lands under a generation nobody reads again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use forum_core::DomainError;
use forum_core::pagination::PageRequest;
use forum_core::ports::{Cache, CacheError};

/// Name every list entry is stored under.
pub const TOPIC_LIST_CACHE: &str = "lista_de_topicos";

const GENERATION_KEY: &str = "lista_de_topicos_generation";

/// Everything a cached list page depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub course_name: Option<String>,
    pub page: PageRequest,
}

impl ListKey {
    fn render(&self, generation: i64) -> String {
        let sort = self.page.sort();
        // The course name goes last: it is free text and may contain ':'.
        let filter = match &self.course_name {
            Some(name) => format!("={name}"),
            None => "-".to_string(),
        };

        format!(
            "{TOPIC_LIST_CACHE}:{generation}:{}:{}:{}:{}:{filter}",
            self.page.page(),
            self.page.size(),
            sort.field,
            sort.direction.as_str(),
        )
    }
}

/// Read-through cache for list pages on top of any [`Cache`] backend.
///
/// Backend failures never fail a request: unreadable entries count as a
/// miss and failed writes are only logged.
#[derive(Clone)]
pub struct TopicListCache {
    cache: Arc<dyn Cache>,
    ttl: Option<Duration>,
}

impl TopicListCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self { cache, ttl }
    }

    /// Return the cached page for `key`, or compute it with `load` and store it.
    pub async fn get_or_load<T, F, Fut>(&self, key: &ListKey, load: F) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let cache_key = key.render(self.generation().await);

        if let Some(raw) = self.cache.get(&cache_key).await {
            match serde_json::from_str::<T>(&raw) {
                Ok(page) => {
                    tracing::debug!(key = %cache_key, "Topic list served from cache");
                    return Ok(page);
                }
                Err(e) => {
                    tracing::warn!(
                        key = %cache_key,
                        error = %e,
                        "Discarding unreadable cache entry"
                    );
                }
            }
        }

        let page = load().await?;

        if let Err(e) = self.store(&cache_key, &page).await {
            tracing::warn!(key = %cache_key, error = %e, "Failed to cache topic list");
        }

        Ok(page)
    }

    /// Drop every cached list page.
    pub async fn evict_all(&self) {
        match self.cache.increment(GENERATION_KEY).await {
            Ok(generation) => tracing::debug!(generation, "Topic list cache generation advanced"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to advance topic list cache generation")
            }
        }

        match self.cache.delete_prefix(&format!("{TOPIC_LIST_CACHE}:")).await {
            Ok(removed) => tracing::debug!(removed, "Topic list cache evicted"),
            Err(e) => tracing::warn!(error = %e, "Failed to delete cached topic lists"),
        }
    }

    async fn generation(&self) -> i64 {
        self.cache
            .get(GENERATION_KEY)
            .await
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    async fn store<T: Serialize>(&self, key: &str, page: &T) -> Result<(), CacheError> {
        let raw =
            serde_json::to_string(page).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.cache.set(key, &raw, self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use forum_core::pagination::{Sort, TopicSortField};
    use forum_infra::InMemoryCache;

    fn key(course_name: Option<&str>) -> ListKey {
        ListKey {
            course_name: course_name.map(str::to_string),
            page: PageRequest::new(0, 10, Sort::desc(TopicSortField::Title)).unwrap(),
        }
    }

    #[test]
    fn test_key_covers_every_parameter() {
        let rendered = key(Some("Spring Boot")).render(3);
        assert_eq!(rendered, "lista_de_topicos:3:0:10:titulo:desc:=Spring Boot");
        assert_eq!(key(None).render(0), "lista_de_topicos:0:0:10:titulo:desc:-");
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = TopicListCache::new(Arc::new(InMemoryCache::new()), None);
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<i64> = cache
                .get_or_load(&key(None), || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_evict_forces_reload() {
        let cache = TopicListCache::new(Arc::new(InMemoryCache::new()), None);

        let first: Vec<i64> = cache
            .get_or_load(&key(None), || async { Ok(vec![1]) })
            .await
            .unwrap();
        cache.evict_all().await;
        let second: Vec<i64> = cache
            .get_or_load(&key(None), || async { Ok(vec![1, 2]) })
            .await
            .unwrap();

        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_page_loaded_before_eviction_is_never_served() {
        let backend = Arc::new(InMemoryCache::new());
        let cache = TopicListCache::new(backend.clone(), None);

        // A slow reader picked its key before the mutation evicted the cache.
        let stale_key = key(None).render(cache.generation().await);
        cache.evict_all().await;
        backend.set(&stale_key, "[1]", None).await.unwrap();

        let fresh: Vec<i64> = cache
            .get_or_load(&key(None), || async { Ok(vec![1, 2]) })
            .await
            .unwrap();
        assert_eq!(fresh, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_load_error_is_not_cached() {
        let cache = TopicListCache::new(Arc::new(InMemoryCache::new()), None);

        let failed: Result<Vec<i64>, _> = cache
            .get_or_load(&key(None), || async {
                Err(DomainError::Internal("boom".to_string()))
            })
            .await;
        assert!(failed.is_err());

        let loaded: Vec<i64> = cache
            .get_or_load(&key(None), || async { Ok(vec![7]) })
            .await
            .unwrap();
        assert_eq!(loaded, vec![7]);
    }

    struct BrokenCache;

    #[async_trait]
    impl Cache for BrokenCache {
        async fn get(&self, _key: &str) -> Option<String> {
            None
        }

        async fn set(&self, _: &str, _: &str, _: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }

        async fn exists(&self, _key: &str) -> bool {
            false
        }

        async fn delete_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }

        async fn increment(&self, _key: &str) -> Result<i64, CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades_to_store_reads() {
        let cache = TopicListCache::new(Arc::new(BrokenCache), None);

        let value: Vec<i64> = cache
            .get_or_load(&key(None), || async { Ok(vec![4]) })
            .await
            .unwrap();
        cache.evict_all().await;

        assert_eq!(value, vec![4]);
    }
}
