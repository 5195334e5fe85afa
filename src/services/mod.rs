pub mod backend;
pub mod kv_store;
pub mod session;

pub use backend::{AnalysisBackend, BackendError};
pub use kv_store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use session::{AlwaysActive, SessionFlag, SessionGate};
