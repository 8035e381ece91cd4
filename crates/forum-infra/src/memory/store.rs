//! In-memory forum store - used when no database is configured and in tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use forum_core::domain::{Author, Course, NewTopic, Reply, Topic};
use forum_core::error::RepoError;
use forum_core::pagination::{Page, PageRequest, SortDirection, TopicSortField};
use forum_core::ports::{ReadRepository, ReplyRepository, TopicRepository, TopicTransaction};

#[derive(Debug, Clone, Default)]
struct ForumData {
    courses: HashMap<i64, Course>,
    topics: BTreeMap<i64, Topic>,
    replies: BTreeMap<i64, Reply>,
}

/// Topic store, course lookup and reply source kept in process memory.
///
/// Reads see the last committed state. A transaction holds the write lock
/// for its whole lifetime and edits a private copy that replaces the shared
/// state on commit, so writers are serialized and aborted work is invisible.
/// Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryForumStore {
    data: Arc<RwLock<ForumData>>,
    next_topic_id: Arc<AtomicI64>,
    next_reply_id: Arc<AtomicI64>,
}

impl InMemoryForumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the given course catalogue.
    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let data = ForumData {
            courses: courses.into_iter().map(|c| (c.id, c)).collect(),
            ..ForumData::default()
        };

        Self {
            data: Arc::new(RwLock::new(data)),
            ..Self::default()
        }
    }

    /// Post a reply under an existing topic. Returns `None` if the topic is unknown.
    pub async fn add_reply(
        &self,
        topic_id: i64,
        message: impl Into<String>,
        author: Option<Author>,
    ) -> Option<Reply> {
        let mut data = self.data.write().await;
        if !data.topics.contains_key(&topic_id) {
            return None;
        }

        let reply = Reply {
            id: allocate(&self.next_reply_id),
            topic_id,
            message: message.into(),
            created_at: Utc::now(),
            author,
            solution: false,
        };
        data.replies.insert(reply.id, reply.clone());
        Some(reply)
    }

    async fn select_page<F>(&self, request: &PageRequest, keep: F) -> Page<Topic>
    where
        F: Fn(&Topic) -> bool,
    {
        let data = self.data.read().await;
        let mut matching: Vec<&Topic> = data.topics.values().filter(|t| keep(t)).collect();

        let sort = request.sort();
        matching.sort_by(|a, b| {
            let ordering = compare_by(sort.field, a, b).then_with(|| a.id.cmp(&b.id));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .cloned()
            .collect();

        Page::new(content, request, total)
    }
}

/// Hand out the next id. Ids start at 1 and are never reused, even when the
/// transaction that drew one rolls back.
fn allocate(counter: &AtomicI64) -> i64 {
    counter.fetch_add(1, AtomicOrdering::SeqCst) + 1
}

fn compare_by(field: TopicSortField, a: &Topic, b: &Topic) -> Ordering {
    match field {
        TopicSortField::Id => a.id.cmp(&b.id),
        TopicSortField::Title => a.title.cmp(&b.title),
        TopicSortField::Message => a.message.cmp(&b.message),
        TopicSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        TopicSortField::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

#[async_trait]
impl TopicRepository for InMemoryForumStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Topic>, RepoError> {
        Ok(self.data.read().await.topics.get(&id).cloned())
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Topic>, RepoError> {
        Ok(self.select_page(&page, |_| true).await)
    }

    async fn find_by_course_name(
        &self,
        course_name: &str,
        page: PageRequest,
    ) -> Result<Page<Topic>, RepoError> {
        Ok(self
            .select_page(&page, |t| t.course.name == course_name)
            .await)
    }

    async fn begin(&self) -> Result<Box<dyn TopicTransaction>, RepoError> {
        let guard = self.data.clone().write_owned().await;
        let working = ForumData::clone(&guard);

        Ok(Box::new(InMemoryTopicTransaction {
            guard,
            working,
            next_topic_id: self.next_topic_id.clone(),
        }))
    }
}

#[async_trait]
impl ReadRepository<Course, i64> for InMemoryForumStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Course>, RepoError> {
        Ok(self.data.read().await.courses.get(&id).cloned())
    }
}

#[async_trait]
impl ReplyRepository for InMemoryForumStore {
    async fn find_by_topic_id(&self, topic_id: i64) -> Result<Vec<Reply>, RepoError> {
        let data = self.data.read().await;
        let mut replies: Vec<Reply> = data
            .replies
            .values()
            .filter(|r| r.topic_id == topic_id)
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(replies)
    }
}

/// Transaction over an [`InMemoryForumStore`].
pub struct InMemoryTopicTransaction {
    guard: OwnedRwLockWriteGuard<ForumData>,
    working: ForumData,
    next_topic_id: Arc<AtomicI64>,
}

#[async_trait]
impl TopicTransaction for InMemoryTopicTransaction {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Topic>, RepoError> {
        Ok(self.working.topics.get(&id).cloned())
    }

    async fn insert(&mut self, topic: NewTopic) -> Result<Topic, RepoError> {
        if !self.working.courses.contains_key(&topic.course.id) {
            return Err(RepoError::Constraint(format!(
                "course {} does not exist",
                topic.course.id
            )));
        }

        let topic = topic.into_topic(allocate(&self.next_topic_id));
        self.working.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn update(&mut self, topic: &Topic) -> Result<(), RepoError> {
        let stored = self
            .working
            .topics
            .get_mut(&topic.id)
            .ok_or(RepoError::NotFound)?;

        stored.revise(topic.title.clone(), topic.message.clone());
        Ok(())
    }

    async fn delete(&mut self, id: i64) -> Result<(), RepoError> {
        self.working
            .topics
            .remove(&id)
            .ok_or(RepoError::NotFound)?;
        self.working.replies.retain(|_, r| r.topic_id != id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let Self {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forum_core::pagination::Sort;

    fn store() -> InMemoryForumStore {
        InMemoryForumStore::with_courses([
            Course::new(1, "Spring Boot", "Programação"),
            Course::new(2, "HTML 5", "Front-end"),
        ])
    }

    async fn create(store: &InMemoryForumStore, title: &str, course_id: i64) -> Topic {
        let course = ReadRepository::<Course, i64>::find_by_id(store, course_id)
            .await
            .unwrap()
            .unwrap();
        let mut txn = store.begin().await.unwrap();
        let topic = txn
            .insert(NewTopic::new(title.to_string(), "mensagem".to_string(), course))
            .await
            .unwrap();
        txn.commit().await.unwrap();
        topic
    }

    #[tokio::test]
    async fn test_ids_are_positive_and_never_reused() {
        let store = store();
        let first = create(&store, "a", 1).await;

        let mut txn = store.begin().await.unwrap();
        txn.delete(first.id).await.unwrap();
        txn.commit().await.unwrap();

        let second = create(&store, "b", 1).await;
        assert!(first.id > 0);
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = store();
        let topic = create(&store, "original", 1).await;

        let mut txn = store.begin().await.unwrap();
        let mut changed = topic.clone();
        changed.revise("alterado".to_string(), "outra".to_string());
        txn.update(&changed).await.unwrap();
        txn.rollback().await.unwrap();

        let stored = TopicRepository::find_by_id(&store, topic.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "original");
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = store();
        {
            let mut txn = store.begin().await.unwrap();
            txn.insert(NewTopic::new(
                "t".to_string(),
                "m".to_string(),
                Course::new(1, "Spring Boot", "Programação"),
            ))
            .await
            .unwrap();
        }

        let page = store
            .find_all(PageRequest::new(0, 10, Sort::default()).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_page_sorting_and_course_filter() {
        let store = store();
        create(&store, "b", 1).await;
        create(&store, "c", 2).await;
        create(&store, "a", 1).await;

        let request = PageRequest::new(0, 2, Sort::desc(TopicSortField::Title)).unwrap();
        let page = store.find_all(request).await.unwrap();
        let titles: Vec<&str> = page.content.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b"]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages(), 2);

        let request = PageRequest::new(0, 10, Sort::asc(TopicSortField::Id)).unwrap();
        let page = store.find_by_course_name("Spring Boot", request).await.unwrap();
        assert_eq!(page.total_elements, 2);
        assert!(page.content.iter().all(|t| t.course.id == 1));

        let page = store.find_by_course_name("spring boot", request).await.unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_replies() {
        let store = store();
        let topic = create(&store, "com respostas", 1).await;
        store.add_reply(topic.id, "resposta", None).await.unwrap();

        let mut txn = store.begin().await.unwrap();
        txn.delete(topic.id).await.unwrap();
        txn.commit().await.unwrap();

        assert!(store.find_by_topic_id(topic.id).await.unwrap().is_empty());
        assert!(store.add_reply(topic.id, "tarde demais", None).await.is_none());
    }
}
