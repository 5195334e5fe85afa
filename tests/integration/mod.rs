use std::env;
use std::path::Path;
use tempfile::TempDir;

/// Temporary PhoneStar workspace. Points `PHONESTAR_HOME` at a fresh
/// directory for the lifetime of the harness.
pub struct IntegrationHarness {
    workspace: TempDir,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        env::set_var("PHONESTAR_HOME", workspace.path());
        Self { workspace }
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }
}

mod dialogue_events;
mod dialogue_failures;
mod history_persistence;
pub mod support;
