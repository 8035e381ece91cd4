//! Data Transfer Objects - request/response types for the topics API.
//!
//! Request forms keep the Portuguese field names clients already send
//! (`titulo`, `mensagem`, `cursoId`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::response::FieldError;

/// Longest title accepted, in characters.
pub const MAX_TITLE_LENGTH: usize = 150;

/// Request to open a new topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicForm {
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub mensagem: String,
    pub curso_id: Option<i64>,
}

impl TopicForm {
    /// Check every field, collecting all failures.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_title(&self.titulo, &mut errors);
        check_message(&self.mensagem, &mut errors);

        match self.curso_id {
            None => errors.push(FieldError::new("cursoId", "must not be null")),
            Some(id) if id <= 0 => errors.push(FieldError::new("cursoId", "must be positive")),
            Some(_) => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request to change the title and message of a topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTopicForm {
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub mensagem: String,
}

impl UpdateTopicForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_title(&self.titulo, &mut errors);
        check_message(&self.mensagem, &mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    if title.trim().is_empty() {
        errors.push(FieldError::new("titulo", "must not be blank"));
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push(FieldError::new(
            "titulo",
            format!("must be at most {MAX_TITLE_LENGTH} characters"),
        ));
    }
}

fn check_message(message: &str, errors: &mut Vec<FieldError>) {
    if message.trim().is_empty() {
        errors.push(FieldError::new("mensagem", "must not be blank"));
    }
}

/// List view of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDto {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub creation_date: DateTime<Utc>,
    pub status: String,
    pub course_name: String,
}

/// A reply as shown on the topic detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDto {
    pub id: i64,
    pub message: String,
    pub creation_date: DateTime<Utc>,
    pub author_name: Option<String>,
    pub solution: bool,
}

/// Single-topic view: the summary plus author and replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetailDto {
    #[serde(flatten)]
    pub topic: TopicDto,
    pub author_name: Option<String>,
    pub replies: Vec<ReplyDto>,
}

/// A page of items with its navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    pub number: u64,
    pub size: u64,
    pub number_of_elements: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_form_reads_wire_names() {
        let form: TopicForm = serde_json::from_str(
            r#"{"titulo":"Erro ao salvar","mensagem":"Não consigo salvar","cursoId":1}"#,
        )
        .unwrap();

        assert_eq!(form.curso_id, Some(1));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_topic_form_collects_every_error() {
        let form: TopicForm = serde_json::from_str(r#"{"titulo":"  "}"#).unwrap();
        let errors = form.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(fields, vec!["titulo", "mensagem", "cursoId"]);
    }

    #[test]
    fn test_update_form_rejects_long_title() {
        let form = UpdateTopicForm {
            titulo: "x".repeat(MAX_TITLE_LENGTH + 1),
            mensagem: "nova mensagem".to_string(),
        };
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "titulo");
    }

    #[test]
    fn test_detail_flattens_summary_fields() {
        let detail = TopicDetailDto {
            topic: TopicDto {
                id: 1,
                title: "Dúvida".to_string(),
                message: "Como faço?".to_string(),
                creation_date: Utc::now(),
                status: "NAO_RESPONDIDO".to_string(),
                course_name: "Spring Boot".to_string(),
            },
            author_name: None,
            replies: vec![],
        };
        let json = serde_json::to_value(&detail).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["courseName"], "Spring Boot");
        assert!(json["authorName"].is_null());
        assert!(json["replies"].as_array().unwrap().is_empty());
    }
}
