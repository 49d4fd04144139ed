mod loader;
mod settings;

pub use loader::{load_config, CurlhopConfig, ImportConfig, LoadedConfig, LogServiceConfig, CONFIG_FILE_NAME};
pub use settings::{
    LogServiceSettings, Settings, SettingsBuilder, DEFAULT_DOWNLOAD_DIR, DEFAULT_STATE_FILE,
    DEFAULT_TOKEN_ENV,
};
