//! Application services sitting between the HTTP handlers and the ports.

pub mod list_cache;
pub mod topic_service;

pub use list_cache::TopicListCache;
pub use topic_service::{CreateTopic, TopicService, UpdateTopic};
