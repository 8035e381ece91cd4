//! In-memory storage backends.

mod store;

pub use store::{InMemoryForumStore, InMemoryTopicTransaction};
