use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Course};

/// Lifecycle state of a discussion topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicStatus {
    /// Nobody has replied yet.
    #[default]
    NaoRespondido,
    /// Has replies, none accepted.
    NaoSolucionado,
    Solucionado,
    Fechado,
}

impl TopicStatus {
    pub const ALL: [TopicStatus; 4] = [
        TopicStatus::NaoRespondido,
        TopicStatus::NaoSolucionado,
        TopicStatus::Solucionado,
        TopicStatus::Fechado,
    ];

    /// Stable representation used on the wire and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::NaoRespondido => "NAO_RESPONDIDO",
            TopicStatus::NaoSolucionado => "NAO_SOLUCIONADO",
            TopicStatus::Solucionado => "SOLUCIONADO",
            TopicStatus::Fechado => "FECHADO",
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown topic status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TopicStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TopicStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Topic entity - a discussion thread opened under a course.
///
/// `id`, `created_at`, `course` and `author` are fixed once the topic has been
/// stored. Only `title` and `message` change afterwards, through
/// [`Topic::revise`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub status: TopicStatus,
    pub course: Course,
    pub author: Option<Author>,
}

impl Topic {
    /// Replace the editable content of the topic.
    pub fn revise(&mut self, title: String, message: String) {
        self.title = title;
        self.message = message;
    }
}

/// A topic that has not been stored yet. The store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub status: TopicStatus,
    pub course: Course,
    pub author: Option<Author>,
}

impl NewTopic {
    /// Open a new topic under `course` with the default status.
    pub fn new(title: String, message: String, course: Course) -> Self {
        Self {
            title,
            message,
            created_at: Utc::now(),
            status: TopicStatus::default(),
            course,
            author: None,
        }
    }

    /// Attach the id the store assigned.
    pub fn into_topic(self, id: i64) -> Topic {
        Topic {
            id,
            title: self.title,
            message: self.message,
            created_at: self.created_at,
            status: self.status,
            course: self.course,
            author: self.author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_topic_defaults_to_unanswered() {
        let topic = NewTopic::new(
            "Erro ao salvar".to_string(),
            "Não consigo salvar".to_string(),
            Course::new(1, "Spring Boot", "Programação"),
        );
        assert_eq!(topic.status, TopicStatus::NaoRespondido);
        assert!(topic.author.is_none());
    }

    #[test]
    fn test_revise_keeps_identity_and_course() {
        let mut topic = NewTopic::new(
            "antigo".to_string(),
            "mensagem antiga".to_string(),
            Course::new(2, "HTML 5", "Front-end"),
        )
        .into_topic(7);
        let created_at = topic.created_at;

        topic.revise("novo título".to_string(), "nova mensagem".to_string());

        assert_eq!(topic.id, 7);
        assert_eq!(topic.created_at, created_at);
        assert_eq!(topic.course.name, "HTML 5");
        assert_eq!(topic.title, "novo título");
        assert_eq!(topic.message, "nova mensagem");
    }

    #[test]
    fn test_status_string_form() {
        for status in TopicStatus::ALL {
            assert_eq!(status.as_str().parse::<TopicStatus>(), Ok(status));
        }
        assert_eq!(
            serde_json::to_string(&TopicStatus::NaoRespondido).unwrap(),
            "\"NAO_RESPONDIDO\""
        );
        assert!("RESPONDIDO".parse::<TopicStatus>().is_err());
    }
}
