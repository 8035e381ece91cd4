//! Domain entities - the core business objects.

mod course;
mod reply;
mod topic;

pub use course::{Author, Course};
pub use reply::Reply;
pub use topic::{NewTopic, Topic, TopicStatus};
