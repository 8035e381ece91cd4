use async_trait::async_trait;

use crate::domain::{Course, NewTopic, Reply, Topic};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic read-only repository over entities owned elsewhere.
#[async_trait]
pub trait ReadRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;
}

/// Course lookup. Courses are never created or changed by this service.
pub trait CourseRepository: ReadRepository<Course, i64> {}

impl<R> CourseRepository for R where R: ReadRepository<Course, i64> {}

/// Replies shown on the topic detail view.
#[async_trait]
pub trait ReplyRepository: Send + Sync {
    /// All replies of a topic, oldest first.
    async fn find_by_topic_id(&self, topic_id: i64) -> Result<Vec<Reply>, RepoError>;
}

/// Topic store.
///
/// Reads run outside any transaction. Every write goes through a
/// [`TopicTransaction`] obtained from [`TopicRepository::begin`].
#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Topic>, RepoError>;

    /// One page over all topics.
    async fn find_all(&self, page: PageRequest) -> Result<Page<Topic>, RepoError>;

    /// One page over the topics whose course name equals `course_name` exactly.
    async fn find_by_course_name(
        &self,
        course_name: &str,
        page: PageRequest,
    ) -> Result<Page<Topic>, RepoError>;

    /// Open a write transaction.
    async fn begin(&self) -> Result<Box<dyn TopicTransaction>, RepoError>;
}

/// An open, all-or-nothing unit of work on the topic store.
///
/// Writes become visible to other readers only after [`commit`]. Dropping the
/// transaction without committing discards them.
///
/// [`commit`]: TopicTransaction::commit
#[async_trait]
pub trait TopicTransaction: Send {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Topic>, RepoError>;

    /// Store a new topic and return it with its assigned id.
    async fn insert(&mut self, topic: NewTopic) -> Result<Topic, RepoError>;

    /// Persist the editable content (title and message) of an existing topic.
    async fn update(&mut self, topic: &Topic) -> Result<(), RepoError>;

    /// Hard-delete a topic and its replies.
    async fn delete(&mut self, id: i64) -> Result<(), RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}
