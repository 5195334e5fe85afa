//! Typed publish/subscribe surface between the dialogue core and the UI shell.

mod channel;

pub use channel::{EventChannel, EventHandler, HandlerId, Subscription};

use crate::chat::Category;
use crate::models::{AnalysisRecord, Pagination, Turn};
use serde::Serialize;

/// Every event carried by the [`EventChannel`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum ChatEvent {
    /// The user turn is in history, before any network round trip.
    #[serde(rename = "turn:user-added")]
    UserTurnAdded(Turn),
    /// Processing began; drives the typing indicator.
    #[serde(rename = "turn:started")]
    TurnStarted,
    #[serde(rename = "turn:assistant-added")]
    AssistantTurnAdded(Turn),
    /// Fires exactly once for every input that started processing.
    #[serde(rename = "turn:ended")]
    TurnEnded,
    /// Snapshot of the conversation right after a clear.
    #[serde(rename = "history:cleared")]
    HistoryCleared(Vec<Turn>),
    /// Conversation loaded and the engine is listening.
    #[serde(rename = "chat:ready")]
    ConversationReady(Vec<Turn>),

    /// Raw text typed by the user.
    #[serde(rename = "chat:submit")]
    SubmitText(String),
    #[serde(rename = "chat:clear")]
    ClearConversation,
    #[serde(rename = "chat:category-selected")]
    CategorySelected(Category),

    #[serde(rename = "analysis-history:loaded")]
    AnalysisHistoryLoaded {
        records: Vec<AnalysisRecord>,
        pagination: Pagination,
    },
    #[serde(rename = "analysis-history:more-loaded")]
    AnalysisHistoryMoreLoaded {
        records: Vec<AnalysisRecord>,
        pagination: Pagination,
    },
    #[serde(rename = "analysis-history:load-failed")]
    AnalysisHistoryLoadFailed(String),
    #[serde(rename = "analysis-history:cleared")]
    AnalysisHistoryCleared,
    #[serde(rename = "analysis-history:clear-failed")]
    AnalysisHistoryClearFailed(String),
    #[serde(rename = "analysis-history:item-selected")]
    AnalysisHistoryItemSelected(String),
}

/// Subscription key; one per [`ChatEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UserTurnAdded,
    TurnStarted,
    AssistantTurnAdded,
    TurnEnded,
    HistoryCleared,
    ConversationReady,
    SubmitText,
    ClearConversation,
    CategorySelected,
    AnalysisHistoryLoaded,
    AnalysisHistoryMoreLoaded,
    AnalysisHistoryLoadFailed,
    AnalysisHistoryCleared,
    AnalysisHistoryClearFailed,
    AnalysisHistoryItemSelected,
}

impl EventKind {
    /// Wire name used by the UI shell.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::UserTurnAdded => "turn:user-added",
            EventKind::TurnStarted => "turn:started",
            EventKind::AssistantTurnAdded => "turn:assistant-added",
            EventKind::TurnEnded => "turn:ended",
            EventKind::HistoryCleared => "history:cleared",
            EventKind::ConversationReady => "chat:ready",
            EventKind::SubmitText => "chat:submit",
            EventKind::ClearConversation => "chat:clear",
            EventKind::CategorySelected => "chat:category-selected",
            EventKind::AnalysisHistoryLoaded => "analysis-history:loaded",
            EventKind::AnalysisHistoryMoreLoaded => "analysis-history:more-loaded",
            EventKind::AnalysisHistoryLoadFailed => "analysis-history:load-failed",
            EventKind::AnalysisHistoryCleared => "analysis-history:cleared",
            EventKind::AnalysisHistoryClearFailed => "analysis-history:clear-failed",
            EventKind::AnalysisHistoryItemSelected => "analysis-history:item-selected",
        }
    }
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChatEvent::UserTurnAdded(_) => EventKind::UserTurnAdded,
            ChatEvent::TurnStarted => EventKind::TurnStarted,
            ChatEvent::AssistantTurnAdded(_) => EventKind::AssistantTurnAdded,
            ChatEvent::TurnEnded => EventKind::TurnEnded,
            ChatEvent::HistoryCleared(_) => EventKind::HistoryCleared,
            ChatEvent::ConversationReady(_) => EventKind::ConversationReady,
            ChatEvent::SubmitText(_) => EventKind::SubmitText,
            ChatEvent::ClearConversation => EventKind::ClearConversation,
            ChatEvent::CategorySelected(_) => EventKind::CategorySelected,
            ChatEvent::AnalysisHistoryLoaded { .. } => EventKind::AnalysisHistoryLoaded,
            ChatEvent::AnalysisHistoryMoreLoaded { .. } => EventKind::AnalysisHistoryMoreLoaded,
            ChatEvent::AnalysisHistoryLoadFailed(_) => EventKind::AnalysisHistoryLoadFailed,
            ChatEvent::AnalysisHistoryCleared => EventKind::AnalysisHistoryCleared,
            ChatEvent::AnalysisHistoryClearFailed(_) => EventKind::AnalysisHistoryClearFailed,
            ChatEvent::AnalysisHistoryItemSelected(_) => EventKind::AnalysisHistoryItemSelected,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}
