use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};

use super::KeyValueStore;

/// Keeps every key in one pretty-printed JSON object on disk. Each `set`
/// rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading state file {}", path.display()))?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)
                    .with_context(|| format!("parsing state file {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating state directory {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(&*entries)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("writing state file {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_file_store_persists_between_instances() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("state/curlhop.json");

        let store = JsonFileStore::open(&path)?;
        assert_eq!(store.get("services"), None);
        store.set("services", "[\"https://a.example\"]")?;

        let reopened = JsonFileStore::open(&path)?;
        assert_eq!(
            reopened.get("services").as_deref(),
            Some("[\"https://a.example\"]")
        );
        Ok(())
    }

    #[test]
    fn json_file_store_reports_corrupt_files() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("state.json");
        fs::write(&path, "not json")?;

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("parsing state file"));
        Ok(())
    }

    #[test]
    fn memory_store_round_trips_values() -> Result<()> {
        let store = MemoryStore::new();
        store.set("requestId", "abc")?;
        assert_eq!(store.get("requestId").as_deref(), Some("abc"));
        Ok(())
    }
}
