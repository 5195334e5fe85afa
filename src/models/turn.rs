//! Conversation turn model shared by the dialogue engine and its subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One immutable message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Analysis payload, only on assistant turns produced by a successful
    /// phone-number analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<Value>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), None)
    }

    pub fn assistant_with_analysis(content: impl Into<String>, analysis_data: Value) -> Self {
        Self::new(Role::Assistant, content.into(), Some(analysis_data))
    }

    fn new(role: Role, content: String, analysis_data: Option<Value>) -> Self {
        Self {
            id: format!("msg_{}_{}", role.as_str(), Uuid::new_v4().simple()),
            role,
            content,
            timestamp: Utc::now(),
            analysis_data,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn has_analysis(&self) -> bool {
        self.analysis_data.is_some()
    }
}
