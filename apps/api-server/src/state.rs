//! Application state - shared across all handlers.

use std::sync::Arc;

use forum_core::domain::Course;
use forum_core::ports::{Cache, CacheError, CourseRepository, ReplyRepository, TopicRepository};
use forum_infra::{InMemoryCache, InMemoryForumStore};

#[cfg(feature = "postgres")]
use forum_infra::database::{
    DatabaseConnections, PostgresCourseRepository, PostgresReplyRepository,
    PostgresTopicRepository,
};
#[cfg(feature = "redis")]
use forum_infra::{RedisCache, RedisConfig};

use crate::config::{AppConfig, CacheBackend};
use crate::services::{TopicListCache, TopicService};

/// Failures that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Cache backend unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("Database migration failed: {0}")]
    Migration(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub topics: Arc<TopicService>,
}

struct Stores {
    topics: Arc<dyn TopicRepository>,
    courses: Arc<dyn CourseRepository>,
    replies: Arc<dyn ReplyRepository>,
}

impl Stores {
    fn in_memory(store: InMemoryForumStore) -> Self {
        let store = Arc::new(store);
        Self {
            topics: store.clone(),
            courses: store.clone(),
            replies: store,
        }
    }
}

/// Course catalogue of database-less runs.
pub fn default_courses() -> Vec<Course> {
    vec![
        Course::new(1, "Spring Boot", "Programação"),
        Course::new(2, "HTML 5", "Front-end"),
        Course::new(3, "Rust", "Programação"),
    ]
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let stores = init_stores(config).await?;
        let cache = init_cache(config.cache.backend).await?;

        let service = TopicService::new(
            stores.topics,
            stores.courses,
            stores.replies,
            TopicListCache::new(cache, config.cache.list_ttl),
        );

        tracing::info!("Application state initialized");

        Ok(Self {
            topics: Arc::new(service),
        })
    }

    /// State over an in-memory store and cache, without expiry.
    pub fn in_memory(store: InMemoryForumStore) -> Self {
        let stores = Stores::in_memory(store);
        let service = TopicService::new(
            stores.topics,
            stores.courses,
            stores.replies,
            TopicListCache::new(Arc::new(InMemoryCache::new()), None),
        );

        Self {
            topics: Arc::new(service),
        }
    }
}

#[cfg(feature = "postgres")]
async fn init_stores(config: &AppConfig) -> Result<Stores, StartupError> {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Ok(Stores::in_memory(InMemoryForumStore::with_courses(
            default_courses(),
        )));
    };

    let connections = match DatabaseConnections::init(db_config).await {
        Ok(connections) => connections,
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            return Ok(Stores::in_memory(InMemoryForumStore::with_courses(
                default_courses(),
            )));
        }
    };

    if db_config.run_migrations {
        use migration::{Migrator, MigratorTrait};

        tracing::info!("Applying pending migrations");
        Migrator::up(&connections.main, None)
            .await
            .map_err(|e| StartupError::Migration(e.to_string()))?;
    }

    let db = connections.main;
    Ok(Stores {
        topics: Arc::new(PostgresTopicRepository::new(db.clone())),
        courses: Arc::new(PostgresCourseRepository::new(db.clone())),
        replies: Arc::new(PostgresReplyRepository::new(db)),
    })
}

#[cfg(not(feature = "postgres"))]
async fn init_stores(_config: &AppConfig) -> Result<Stores, StartupError> {
    tracing::info!("Running without postgres feature - using in-memory store");
    Ok(Stores::in_memory(InMemoryForumStore::with_courses(
        default_courses(),
    )))
}

async fn init_cache(backend: CacheBackend) -> Result<Arc<dyn Cache>, StartupError> {
    match backend {
        CacheBackend::Memory => {
            tracing::info!("Using in-memory list cache");
            Ok(Arc::new(InMemoryCache::new()))
        }
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            let redis_config = RedisConfig::from_env();
            let fallback = redis_config.fallback_to_memory;

            match RedisCache::connect(redis_config).await {
                Ok(cache) => Ok(Arc::new(cache)),
                Err(e) if fallback => {
                    tracing::warn!(
                        "Redis unavailable: {}. Falling back to in-memory list cache.",
                        e
                    );
                    Ok(Arc::new(InMemoryCache::new()))
                }
                Err(e) => Err(e.into()),
            }
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => {
            tracing::warn!("Built without redis feature - using in-memory list cache");
            Ok(Arc::new(InMemoryCache::new()))
        }
    }
}
