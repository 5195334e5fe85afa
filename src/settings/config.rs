//! Configuration primitives for the PhoneStar chat core.
//!
//! Stored in a machine-readable TOML file located at:
//!   $PHONESTAR_HOME/config/config.toml when the variable is set
//!   <OS data dir>/PhoneStar/config/config.toml otherwise
//!
//! The config tracks conversation limits, the persistence key used for chat
//! history, backend timeouts and the analysis-history page size.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Conversation behaviour (history cap, storage key, welcome text).
    #[serde(default)]
    pub chat: ChatSettings,
    /// Remote analysis service knobs.
    #[serde(default)]
    pub backend: BackendSettings,
    /// Analysis-history panel defaults.
    #[serde(default)]
    pub history_panel: HistoryPanelSettings,
}

/// Conversation history and dialogue defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Maximum number of turns retained; oldest turns are dropped first.
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    /// Key under which the conversation is persisted in the key-value store.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Assistant greeting synthesized on first start and after a clear.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_cap: default_history_cap(),
            storage_key: default_storage_key(),
            welcome_message: default_welcome_message(),
        }
    }
}

const fn default_history_cap() -> usize {
    50
}

fn default_storage_key() -> String {
    "phone_analysis_chat_history".to_string()
}

fn default_welcome_message() -> String {
    "Xin chào! Tôi là trợ lý phân tích số điện thoại theo phương pháp Tứ Cát Tứ Hung. \
Bạn có thể nhập số điện thoại để tôi phân tích hoặc đặt câu hỏi về ý nghĩa các con số."
        .to_string()
}

/// Settings applied around every remote analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Wall-clock timeout (ms) for a single analyze/ask call.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

const fn default_request_timeout_ms() -> u64 {
    15_000
}

/// Pagination defaults for the analysis-history panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPanelSettings {
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

impl Default for HistoryPanelSettings {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
        }
    }
}

const fn default_page_limit() -> u32 {
    20
}

/// Standard relative path to the config file (resolved per OS at runtime).
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// File backing the [`FileStore`](crate::services::FileStore) used by the binary.
pub const STORE_FILE_NAME: &str = "local_storage.json";

use anyhow::{Context, Result};
use directories::BaseDirs;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Returns the root directory where PhoneStar stores data.
///
/// Order of precedence:
/// 1. `PHONESTAR_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var("PHONESTAR_HOME") {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("PhoneStar"))
}

pub fn config_dir() -> Result<PathBuf> {
    let root = workspace_root()?;
    Ok(root.join("config"))
}

/// Path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Path to the JSON file holding persisted key-value entries.
pub fn store_file_path() -> Result<PathBuf> {
    Ok(workspace_root()?.join(STORE_FILE_NAME))
}

/// Loads the configuration from disk or returns defaults.
pub fn load_or_default() -> Result<AppConfig> {
    let path = config_file_path()?;
    if path.exists() {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let cfg: AppConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(cfg)
    } else {
        Ok(AppConfig::default())
    }
}

/// Persists the configuration to disk.
pub fn save(config: &AppConfig) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = config_file_path()?;
    let data = toml::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}
