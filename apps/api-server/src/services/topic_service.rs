//! Topic use cases: list, create, detail, update and delete.
//!
//! Writes run inside one store transaction each. The list cache is evicted
//! only after a commit, never for a request that changed nothing.

use std::sync::Arc;

use forum_core::DomainError;
use forum_core::domain::{NewTopic, Reply, Topic};
use forum_core::error::RepoError;
use forum_core::pagination::{Page, PageRequest};
use forum_core::ports::{
    CourseRepository, ReadRepository, ReplyRepository, TopicRepository, TopicTransaction,
};
use forum_shared::dto::{PageDto, ReplyDto, TopicDetailDto, TopicDto, TopicForm, UpdateTopicForm};
use forum_shared::FieldError;

use super::list_cache::{ListKey, TopicListCache};

/// A validated request to open a topic.
#[derive(Debug, Clone)]
pub struct CreateTopic {
    pub title: String,
    pub message: String,
    pub course_id: i64,
}

impl TryFrom<TopicForm> for CreateTopic {
    type Error = Vec<FieldError>;

    fn try_from(form: TopicForm) -> Result<Self, Self::Error> {
        form.validate()?;

        match form.curso_id {
            Some(course_id) => Ok(Self {
                title: form.titulo,
                message: form.mensagem,
                course_id,
            }),
            None => Err(vec![FieldError::new("cursoId", "must not be null")]),
        }
    }
}

/// A validated title and message change.
#[derive(Debug, Clone)]
pub struct UpdateTopic {
    pub title: String,
    pub message: String,
}

impl TryFrom<UpdateTopicForm> for UpdateTopic {
    type Error = Vec<FieldError>;

    fn try_from(form: UpdateTopicForm) -> Result<Self, Self::Error> {
        form.validate()?;

        Ok(Self {
            title: form.titulo,
            message: form.mensagem,
        })
    }
}

/// Topic application service.
pub struct TopicService {
    topics: Arc<dyn TopicRepository>,
    courses: Arc<dyn CourseRepository>,
    replies: Arc<dyn ReplyRepository>,
    list_cache: TopicListCache,
}

impl TopicService {
    pub fn new(
        topics: Arc<dyn TopicRepository>,
        courses: Arc<dyn CourseRepository>,
        replies: Arc<dyn ReplyRepository>,
        list_cache: TopicListCache,
    ) -> Self {
        Self {
            topics,
            courses,
            replies,
            list_cache,
        }
    }

    /// One page of topics, optionally restricted to a course name.
    pub async fn list(
        &self,
        course_name: Option<String>,
        page: PageRequest,
    ) -> Result<PageDto<TopicDto>, DomainError> {
        let key = ListKey { course_name, page };

        self.list_cache
            .get_or_load(&key, || async {
                let topics = match key.course_name.as_deref() {
                    Some(name) => self.topics.find_by_course_name(name, key.page).await?,
                    None => self.topics.find_all(key.page).await?,
                };

                tracing::debug!(
                    course = ?key.course_name,
                    page = key.page.page(),
                    total = topics.total_elements,
                    "Topic list loaded from store"
                );
                Ok::<_, DomainError>(page_dto(topics.map(|t| topic_dto(&t))))
            })
            .await
    }

    pub async fn create(&self, command: CreateTopic) -> Result<TopicDto, DomainError> {
        // Resolved before the transaction opens; the in-memory store holds its
        // write lock for the lifetime of a transaction.
        let course = self
            .courses
            .find_by_id(command.course_id)
            .await?
            .ok_or_else(|| {
                DomainError::invalid_field(
                    "cursoId",
                    format!("course {} does not exist", command.course_id),
                )
            })?;

        let new_topic = NewTopic::new(command.title, command.message, course);
        let mut txn = self.topics.begin().await?;
        let topic = match txn.insert(new_topic).await {
            Ok(topic) => {
                txn.commit().await?;
                topic
            }
            Err(e) => {
                abort(txn, &e).await;
                return Err(e.into());
            }
        };

        tracing::info!(topic_id = topic.id, course = %topic.course.name, "Topic created");
        self.list_cache.evict_all().await;

        Ok(topic_dto(&topic))
    }

    /// Full view of one topic, `None` if it does not exist.
    pub async fn detail(&self, id: i64) -> Result<Option<TopicDetailDto>, DomainError> {
        let Some(topic) = self.topics.find_by_id(id).await? else {
            tracing::debug!(topic_id = id, "Topic not found");
            return Ok(None);
        };

        let replies = self.replies.find_by_topic_id(id).await?;
        Ok(Some(detail_dto(topic, replies)))
    }

    /// Change title and message. `None` if the topic does not exist.
    pub async fn update(
        &self,
        id: i64,
        change: UpdateTopic,
    ) -> Result<Option<TopicDto>, DomainError> {
        let mut txn = self.topics.begin().await?;
        let outcome = revise(txn.as_mut(), id, change).await;

        let Some(topic) = settle(txn, outcome).await? else {
            tracing::debug!(topic_id = id, "Update skipped, topic not found");
            return Ok(None);
        };

        tracing::info!(topic_id = id, "Topic updated");
        self.list_cache.evict_all().await;

        Ok(Some(topic_dto(&topic)))
    }

    /// Remove a topic with its replies. Returns `false` if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut txn = self.topics.begin().await?;
        let outcome = remove(txn.as_mut(), id).await;

        if settle(txn, outcome).await?.is_none() {
            tracing::debug!(topic_id = id, "Delete skipped, topic not found");
            return Ok(false);
        }

        tracing::info!(topic_id = id, "Topic deleted");
        self.list_cache.evict_all().await;

        Ok(true)
    }
}

async fn revise(
    txn: &mut dyn TopicTransaction,
    id: i64,
    change: UpdateTopic,
) -> Result<Option<Topic>, RepoError> {
    let Some(mut topic) = txn.find_by_id(id).await? else {
        return Ok(None);
    };

    topic.revise(change.title, change.message);
    txn.update(&topic).await?;
    Ok(Some(topic))
}

async fn remove(txn: &mut dyn TopicTransaction, id: i64) -> Result<Option<()>, RepoError> {
    if txn.find_by_id(id).await?.is_none() {
        return Ok(None);
    }

    txn.delete(id).await?;
    Ok(Some(()))
}

/// Close `txn` according to the work done in it: commit when it produced a
/// value, roll back when it found nothing or failed.
async fn settle<T>(
    txn: Box<dyn TopicTransaction>,
    outcome: Result<Option<T>, RepoError>,
) -> Result<Option<T>, DomainError> {
    match outcome {
        Ok(Some(value)) => {
            txn.commit().await?;
            Ok(Some(value))
        }
        Ok(None) => {
            txn.rollback().await?;
            Ok(None)
        }
        Err(e) => {
            abort(txn, &e).await;
            Err(e.into())
        }
    }
}

async fn abort(txn: Box<dyn TopicTransaction>, cause: &RepoError) {
    tracing::error!(error = %cause, "Topic transaction failed, rolling back");
    if let Err(e) = txn.rollback().await {
        tracing::error!(error = %e, "Rollback failed");
    }
}

fn topic_dto(topic: &Topic) -> TopicDto {
    TopicDto {
        id: topic.id,
        title: topic.title.clone(),
        message: topic.message.clone(),
        creation_date: topic.created_at,
        status: topic.status.to_string(),
        course_name: topic.course.name.clone(),
    }
}

fn reply_dto(reply: Reply) -> ReplyDto {
    ReplyDto {
        id: reply.id,
        message: reply.message,
        creation_date: reply.created_at,
        author_name: reply.author.map(|a| a.name),
        solution: reply.solution,
    }
}

fn detail_dto(topic: Topic, replies: Vec<Reply>) -> TopicDetailDto {
    TopicDetailDto {
        topic: topic_dto(&topic),
        author_name: topic.author.map(|a| a.name),
        replies: replies.into_iter().map(reply_dto).collect(),
    }
}

fn page_dto<T>(page: Page<T>) -> PageDto<T> {
    let total_pages = page.total_pages();
    let first = page.is_first();
    let last = page.is_last();

    PageDto {
        number_of_elements: page.content.len() as u64,
        number: page.number,
        size: page.size,
        total_elements: page.total_elements,
        total_pages,
        first,
        last,
        content: page.content,
    }
}
