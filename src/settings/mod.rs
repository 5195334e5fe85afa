mod config;

pub use config::{
    config_dir, config_file_path, load_or_default, save, store_file_path, workspace_root,
    AppConfig, BackendSettings, ChatSettings, HistoryPanelSettings, CONFIG_FILE_NAME,
    STORE_FILE_NAME,
};
