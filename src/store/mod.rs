mod history;
mod json_file;
mod services;

pub use history::{CurlHistory, CurlHistoryEntry, DEFAULT_HISTORY_LIMIT};
pub use json_file::{JsonFileStore, MemoryStore};
pub use services::{normalize_origin, ServiceRegistry};

pub const LAST_REQUEST_ID_KEY: &str = "requestId";

/// String key-value persistence for operator state.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}
