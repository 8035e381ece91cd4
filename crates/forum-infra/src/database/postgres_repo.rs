//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::Order;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbConn, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, SelectTwo, Set, TransactionTrait, Unchanged,
};

use forum_core::domain::{Author, Course, NewTopic, Reply, Topic, TopicStatus};
use forum_core::error::RepoError;
use forum_core::pagination::{Page, PageRequest, SortDirection, TopicSortField};
use forum_core::ports::{ReplyRepository, TopicRepository, TopicTransaction};

use super::entity::{course, reply, topic, user};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL course lookup.
pub type PostgresCourseRepository = PostgresBaseRepository<course::Entity>;

type TopicRow = (topic::Model, Option<course::Model>);

/// PostgreSQL topic store.
pub struct PostgresTopicRepository {
    db: DbConn,
}

impl PostgresTopicRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TopicRepository for PostgresTopicRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Topic>, RepoError> {
        fetch_one(&self.db, id).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Topic>, RepoError> {
        fetch_page(&self.db, topics_with_course(), &page).await
    }

    async fn find_by_course_name(
        &self,
        course_name: &str,
        page: PageRequest,
    ) -> Result<Page<Topic>, RepoError> {
        tracing::debug!(course = %course_name, "Listing topics by course name");

        let query = topics_with_course().filter(course::Column::Name.eq(course_name));
        fetch_page(&self.db, query, &page).await
    }

    async fn begin(&self) -> Result<Box<dyn TopicTransaction>, RepoError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(Box::new(PostgresTopicTransaction { txn }))
    }
}

/// Write transaction over the topics table.
pub struct PostgresTopicTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl TopicTransaction for PostgresTopicTransaction {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Topic>, RepoError> {
        fetch_one(&self.txn, id).await
    }

    async fn insert(&mut self, topic: NewTopic) -> Result<Topic, RepoError> {
        let model = topic::ActiveModel {
            id: NotSet,
            title: Set(topic.title.clone()),
            message: Set(topic.message.clone()),
            created_at: Set(topic.created_at.into()),
            status: Set(topic.status.as_str().to_string()),
            course_id: Set(topic.course.id),
            author_id: Set(topic.author.as_ref().map(|a| a.id)),
        }
        .insert(&self.txn)
        .await
        .map_err(map_db_err)?;

        Ok(topic.into_topic(model.id))
    }

    async fn update(&mut self, topic: &Topic) -> Result<(), RepoError> {
        // Only the editable columns are written; the rest stay as stored.
        topic::ActiveModel {
            id: Unchanged(topic.id),
            title: Set(topic.title.clone()),
            message: Set(topic.message.clone()),
            created_at: NotSet,
            status: NotSet,
            course_id: NotSet,
            author_id: NotSet,
        }
        .update(&self.txn)
        .await
        .map_err(map_db_err)?;

        Ok(())
    }

    async fn delete(&mut self, id: i64) -> Result<(), RepoError> {
        let result = topic::Entity::delete_by_id(id)
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let Self { txn } = *self;
        txn.commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        let Self { txn } = *self;
        txn.rollback()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }
}

/// PostgreSQL reply source.
pub struct PostgresReplyRepository {
    db: DbConn,
}

impl PostgresReplyRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReplyRepository for PostgresReplyRepository {
    async fn find_by_topic_id(&self, topic_id: i64) -> Result<Vec<Reply>, RepoError> {
        let rows = reply::Entity::find()
            .filter(reply::Column::TopicId.eq(topic_id))
            .order_by_asc(reply::Column::CreatedAt)
            .order_by_asc(reply::Column::Id)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(model, author)| Reply {
                id: model.id,
                topic_id: model.topic_id,
                message: model.message,
                created_at: model.created_at.into(),
                author: author.map(Author::from),
                solution: model.solution,
            })
            .collect())
    }
}

fn topics_with_course() -> SelectTwo<topic::Entity, course::Entity> {
    topic::Entity::find().find_also_related(course::Entity)
}

async fn fetch_one<C>(db: &C, id: i64) -> Result<Option<Topic>, RepoError>
where
    C: ConnectionTrait,
{
    let row = topics_with_course()
        .filter(topic::Column::Id.eq(id))
        .one(db)
        .await
        .map_err(map_db_err)?;

    match row {
        Some(row) => Ok(hydrate(db, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn fetch_page<C>(
    db: &C,
    query: SelectTwo<topic::Entity, course::Entity>,
    request: &PageRequest,
) -> Result<Page<Topic>, RepoError>
where
    C: ConnectionTrait,
{
    let sort = request.sort();
    let order = match sort.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };

    let mut query = query.order_by(topic::Column::from(sort.field), order.clone());
    if sort.field != TopicSortField::Id {
        // Ties keep a stable order across pages.
        query = query.order_by(topic::Column::Id, order);
    }

    let paginator = query.paginate(db, request.size());
    let total = paginator.num_items().await.map_err(map_db_err)?;
    let rows = paginator
        .fetch_page(request.page())
        .await
        .map_err(map_db_err)?;

    let topics = hydrate(db, rows).await?;
    Ok(Page::new(topics, request, total))
}

/// Turn joined rows into domain topics, loading their authors in one query.
async fn hydrate<C>(db: &C, rows: Vec<TopicRow>) -> Result<Vec<Topic>, RepoError>
where
    C: ConnectionTrait,
{
    let author_ids: Vec<i64> = rows.iter().filter_map(|(t, _)| t.author_id).collect();
    let authors = load_authors(db, author_ids).await?;

    rows.into_iter()
        .map(|(model, course)| to_domain(model, course, &authors))
        .collect()
}

async fn load_authors<C>(db: &C, ids: Vec<i64>) -> Result<HashMap<i64, Author>, RepoError>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(map_db_err)?;

    Ok(users.into_iter().map(|u| (u.id, Author::from(u))).collect())
}

fn to_domain(
    model: topic::Model,
    course: Option<course::Model>,
    authors: &HashMap<i64, Author>,
) -> Result<Topic, RepoError> {
    let course: Course = course
        .ok_or_else(|| {
            RepoError::Query(format!(
                "topic {} references missing course {}",
                model.id, model.course_id
            ))
        })?
        .into();

    let status = model
        .status
        .parse::<TopicStatus>()
        .map_err(|e| RepoError::Query(e.to_string()))?;

    Ok(Topic {
        id: model.id,
        title: model.title,
        message: model.message,
        created_at: model.created_at.into(),
        status,
        course,
        author: model.author_id.and_then(|id| authors.get(&id).cloned()),
    })
}
