//! # Forum Infrastructure
//!
//! Concrete implementations of the ports defined in `forum-core`:
//! the topic store, course lookup and reply source, plus the list cache
//! backends.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL storage via SeaORM
//! - `redis` - Redis cache backend

pub mod cache;
pub mod database;
pub mod memory;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use memory::InMemoryForumStore;

#[cfg(feature = "postgres")]
pub use database::DatabaseConnections;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
