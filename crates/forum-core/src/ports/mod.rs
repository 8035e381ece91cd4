//! Traits the storage and cache backends implement.

mod cache;
mod repository;

pub use cache::{Cache, CacheError};
pub use repository::{
    CourseRepository, ReadRepository, ReplyRepository, TopicRepository, TopicTransaction,
};
