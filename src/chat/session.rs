use super::context::DialogueContext;
use super::history::ConversationHistory;
use crate::services::KeyValueStore;
use crate::settings::ChatSettings;
use std::sync::Arc;

/// Per-session dialogue state owned by one [`DialogueEngine`](super::DialogueEngine).
pub struct DialogueSession {
    pub history: ConversationHistory,
    pub context: DialogueContext,
}

impl DialogueSession {
    pub fn new(history: ConversationHistory) -> Self {
        Self {
            history,
            context: DialogueContext::new(),
        }
    }

    /// Restores the persisted conversation; dialogue memory starts empty.
    pub fn open(store: Arc<dyn KeyValueStore>, settings: &ChatSettings) -> Self {
        Self::new(ConversationHistory::open(store, settings))
    }

    /// Back to the welcome turn with no remembered number.
    pub fn clear(&mut self) {
        self.history.clear();
        self.context.reset();
    }
}
