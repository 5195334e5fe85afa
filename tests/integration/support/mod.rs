pub mod chat;

pub use backend::{BackendCall, ScriptedBackend};
pub use chat::ChatFixture;
pub use events::{EventLog, PANEL_EVENTS, TURN_EVENTS};
