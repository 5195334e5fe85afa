//! Paged list of past analyses stored by the remote service.

mod analysis_history;

pub use analysis_history::{AnalysisHistoryPanel, PanelError};
