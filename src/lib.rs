pub mod chat;
pub mod events;
pub mod models;
pub mod panel;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience.
pub use chat::{Category, ConversationHistory, DialogueContext, DialogueEngine, Intent};
pub use events::{ChatEvent, EventChannel, EventKind};
pub use models::{AnalysisResult, AskRequest, AskResponse, Turn};
pub use panel::AnalysisHistoryPanel;
pub use services::{AnalysisBackend, BackendError};
pub use settings::AppConfig;
