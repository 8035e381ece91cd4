use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

use forum_core::domain::{Course, NewTopic, TopicStatus};
use forum_core::error::RepoError;
use forum_core::ports::{ReadRepository, TopicRepository};

use crate::database::entity::{course, topic};
use crate::database::postgres_repo::{PostgresCourseRepository, PostgresTopicRepository};

fn course_model() -> course::Model {
    course::Model {
        id: 1,
        name: "Spring Boot".to_owned(),
        category: "Programação".to_owned(),
    }
}

fn topic_model(id: i64) -> topic::Model {
    topic::Model {
        id,
        title: "Erro ao salvar".to_owned(),
        message: "Não consigo salvar".to_owned(),
        created_at: Utc::now().into(),
        status: "NAO_RESPONDIDO".to_owned(),
        course_id: 1,
        author_id: None,
    }
}

#[tokio::test]
async fn test_find_course_by_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![course_model()]])
        .into_connection();

    let repo = PostgresCourseRepository::new(db);
    let result: Option<Course> = repo.find_by_id(1).await.unwrap();

    let course = result.unwrap();
    assert_eq!(course.name, "Spring Boot");
}

#[tokio::test]
async fn test_find_topic_by_id_joins_course() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![(topic_model(42), course_model())]])
        .into_connection();

    let repo = PostgresTopicRepository::new(db);
    let topic = repo.find_by_id(42).await.unwrap().unwrap();

    assert_eq!(topic.id, 42);
    assert_eq!(topic.status, TopicStatus::NaoRespondido);
    assert_eq!(topic.course.name, "Spring Boot");
    assert!(topic.author.is_none());
}

#[tokio::test]
async fn test_unknown_status_is_reported() {
    let mut model = topic_model(3);
    model.status = "ARQUIVADO".to_owned();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![(model, course_model())]])
        .into_connection();

    let repo = PostgresTopicRepository::new(db);
    let result = repo.find_by_id(3).await;

    assert!(matches!(result, Err(RepoError::Query(_))));
}

#[tokio::test]
async fn test_insert_returns_assigned_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![topic_model(10)]])
        .into_connection();

    let repo = PostgresTopicRepository::new(db);
    let mut txn = repo.begin().await.unwrap();
    let topic = txn
        .insert(NewTopic::new(
            "Erro ao salvar".to_owned(),
            "Não consigo salvar".to_owned(),
            Course::new(1, "Spring Boot", "Programação"),
        ))
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(topic.id, 10);
    assert_eq!(topic.course.id, 1);
}

#[tokio::test]
async fn test_delete_missing_topic_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresTopicRepository::new(db);
    let mut txn = repo.begin().await.unwrap();
    let result = txn.delete(99).await;
    txn.rollback().await.unwrap();

    assert!(matches!(result, Err(RepoError::NotFound)));
}
