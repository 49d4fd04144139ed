use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::KeyValueStore;

const HISTORY_KEY: &str = "curlHistory";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurlHistoryEntry {
    pub label: String,
    pub curl: String,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Previously executed curl commands, most recent first, unique by label.
pub struct CurlHistory<'a> {
    store: &'a dyn KeyValueStore,
    limit: usize,
}

impl<'a> CurlHistory<'a> {
    pub fn new(store: &'a dyn KeyValueStore, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    pub fn entries(&self) -> Vec<CurlHistoryEntry> {
        let Some(raw) = self.store.get(HISTORY_KEY) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring unreadable curl history");
            Vec::new()
        })
    }

    pub fn get(&self, index: usize) -> Option<CurlHistoryEntry> {
        self.entries().into_iter().nth(index)
    }

    pub fn record(&self, label: &str, curl: &str) -> Result<()> {
        let mut entries = self.entries();
        entries.retain(|entry| entry.label != label);
        entries.insert(
            0,
            CurlHistoryEntry {
                label: label.to_string(),
                curl: curl.to_string(),
                saved_at: Utc::now(),
            },
        );
        entries.truncate(self.limit);
        self.store.set(HISTORY_KEY, &serde_json::to_string(&entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn record_moves_existing_label_to_front() -> Result<()> {
        let store = MemoryStore::new();
        let history = CurlHistory::new(&store, 10);

        history.record("GET /api/a", "curl https://x.example/api/a")?;
        history.record("GET /api/b", "curl https://x.example/api/b")?;
        history.record("GET /api/a", "curl https://y.example/api/a")?;

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "GET /api/a");
        assert_eq!(entries[0].curl, "curl https://y.example/api/a");
        assert_eq!(entries[1].label, "GET /api/b");
        Ok(())
    }

    #[test]
    fn record_respects_the_limit() -> Result<()> {
        let store = MemoryStore::new();
        let history = CurlHistory::new(&store, 2);
        for index in 0..5 {
            history.record(&format!("GET /{index}"), "curl")?;
        }
        let labels: Vec<_> = history.entries().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["GET /4", "GET /3"]);
        assert_eq!(history.get(1).map(|e| e.label).as_deref(), Some("GET /3"));
        assert!(history.get(2).is_none());
        Ok(())
    }
}
