use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;

/// Answer posted under a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub topic_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<Author>,
    /// Marked by the topic owner as the accepted answer.
    pub solution: bool,
}
