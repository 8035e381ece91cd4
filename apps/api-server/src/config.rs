//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "postgres")]
use forum_infra::database::DatabaseConfig;

const DEFAULT_LIST_TTL_SECS: u64 = 300;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    pub cache: CacheConfig,
}

/// Where list pages are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Lifetime of a cached list page. `None` keeps pages until evicted.
    pub list_ttl: Option<Duration>,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        // Redis is the default whenever it has been pointed at.
        let default_backend = if env::var("REDIS_URL").is_ok() {
            CacheBackend::Redis
        } else {
            CacheBackend::Memory
        };

        let backend = match env::var("CACHE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!("{}, using {:?}", e, default_backend);
                default_backend
            }),
            Err(_) => default_backend,
        };

        Self {
            backend,
            list_ttl: parse_ttl(env::var("TOPIC_LIST_CACHE_TTL_SECS").ok().as_deref()),
        }
    }
}

/// Seconds to a TTL; zero means no expiry, garbage means the default.
fn parse_ttl(raw: Option<&str>) -> Option<Duration> {
    let secs = raw
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_LIST_TTL_SECS);

    (secs > 0).then(|| Duration::from_secs(secs))
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        #[cfg(feature = "postgres")]
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            run_migrations: env::var("DB_RUN_MIGRATIONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            #[cfg(feature = "postgres")]
            database,
            cache: CacheConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_backend_names() {
        assert_eq!("redis".parse::<CacheBackend>(), Ok(CacheBackend::Redis));
        assert_eq!(" Memory ".parse::<CacheBackend>(), Ok(CacheBackend::Memory));
        assert!("memcached".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn test_ttl_parsing() {
        assert_eq!(parse_ttl(None), Some(Duration::from_secs(300)));
        assert_eq!(parse_ttl(Some("60")), Some(Duration::from_secs(60)));
        assert_eq!(parse_ttl(Some("0")), None);
        assert_eq!(parse_ttl(Some("soon")), Some(Duration::from_secs(300)));
    }
}
