use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One transcript entry. Assistant content is markdown and is rendered by
/// the front-end rather than shown raw; `succeeded`/`error_detail` record
/// the outcome of the query that produced an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    pub model_used: Option<String>,
}

impl ChatMessage {
    pub fn user(id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
            succeeded: true,
            error_detail: None,
            model_used: None,
        }
    }

    pub fn assistant(id: u64, content: impl Into<String>, model_used: Option<String>) -> Self {
        Self {
            id,
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            succeeded: true,
            error_detail: None,
            model_used,
        }
    }

    pub fn failed_assistant(
        id: u64,
        content: impl Into<String>,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            id,
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            succeeded: false,
            error_detail: Some(error_detail.into()),
            model_used: None,
        }
    }
}
