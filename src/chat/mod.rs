//! Conversational core: input classification, dialogue memory, conversation
//! history and the engine that ties them to the analysis service.

pub mod categories;
pub mod classifier;
pub mod context;
pub mod engine;
pub mod history;
pub mod messages;
pub mod session;

pub use categories::Category;
pub use classifier::{
    classify, extract_phone_numbers, is_phone_number, normalize_digits, InputClassifier, Intent,
};
pub use context::{DialogueContext, LastIntent};
pub use engine::DialogueEngine;
pub use history::{ConversationHistory, PendingSave};
pub use session::DialogueSession;
