use super::backend::ScriptedBackend;
use super::events::{EventLog, TURN_EVENTS};
use phonestar::chat::{DialogueContext, DialogueEngine};
use phonestar::events::EventChannel;
use phonestar::models::Turn;
use phonestar::services::MemoryStore;
use phonestar::settings::AppConfig;
use std::sync::Arc;

/// Engine over an in-memory store and a scripted backend, with every turn
/// event recorded.
pub struct ChatFixture {
    pub backend: Arc<ScriptedBackend>,
    pub store: Arc<MemoryStore>,
    pub channel: EventChannel,
    pub engine: Arc<DialogueEngine>,
    pub log: EventLog,
}

impl ChatFixture {
    pub fn new() -> Self {
        Self::build(|engine| engine)
    }

    pub fn build(configure: impl FnOnce(DialogueEngine) -> DialogueEngine) -> Self {
        let backend = ScriptedBackend::new();
        let store = Arc::new(MemoryStore::new());
        let channel = EventChannel::new();
        let log = EventLog::attach(&channel, TURN_EVENTS);
        let engine = DialogueEngine::from_config(
            &AppConfig::default(),
            store.clone(),
            backend.clone(),
            channel.clone(),
        );
        Self {
            backend,
            store,
            channel,
            engine: Arc::new(configure(engine)),
            log,
        }
    }

    /// Submits `text` and returns the assistant reply.
    pub async fn say(&self, text: &str) -> Turn {
        self.engine
            .handle_user_input(text)
            .await
            .expect("input should start a turn")
    }

    pub fn context(&self) -> DialogueContext {
        self.engine.context()
    }
}
