use chat_types::Role;
use chrono::{DateTime, Utc};

/// A single row in the `messages` table. Rows are never updated or deleted.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Assigned by the database; strictly increasing in insertion order.
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A message that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    /// Stamp `content` with the current time.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn into_stored(self, id: i64) -> ChatMessage {
        ChatMessage {
            id,
            role: self.role,
            content: self.content,
            timestamp: self.timestamp,
        }
    }
}
