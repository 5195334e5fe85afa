pub mod analysis;
pub mod turn;

pub use analysis::{
    format_phone_number, AnalysisRecord, AnalysisResult, AnalysisSummary, AskKind, AskRequest,
    AskResponse, EnergyLevel, HistoryPage, Pagination, StarEntry,
};
pub use turn::{Role, Turn};
