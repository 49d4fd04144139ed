use anyhow::Result;
use tracing::{info, warn};

use super::KeyValueStore;

const SERVICES_KEY: &str = "services";
const ACTIVE_KEY: &str = "activeService";

pub fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}

/// Ordered list of known service origins plus the one currently used as the
/// origin override.
pub struct ServiceRegistry<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> ServiceRegistry<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<String> {
        let Some(raw) = self.store.get(SERVICES_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable service list");
                Vec::new()
            }
        }
    }

    pub fn contains(&self, origin: &str) -> bool {
        let origin = normalize_origin(origin);
        self.list().iter().any(|known| *known == origin)
    }

    /// Appends the origin unless it is already known. Returns whether the
    /// list changed.
    pub fn append_if_absent(&self, origin: &str) -> Result<bool> {
        let origin = normalize_origin(origin);
        if origin.is_empty() {
            return Ok(false);
        }
        let mut list = self.list();
        if list.contains(&origin) {
            return Ok(false);
        }
        info!(%origin, "registering service");
        list.push(origin);
        self.save(&list)?;
        Ok(true)
    }

    /// Removes an origin. When it was the active one, the last remaining
    /// entry becomes active (or none when the list is now empty).
    pub fn remove(&self, origin: &str) -> Result<bool> {
        let origin = normalize_origin(origin);
        let mut list = self.list();
        let before = list.len();
        list.retain(|known| *known != origin);
        if list.len() == before {
            return Ok(false);
        }
        self.save(&list)?;

        if self.active().as_deref() == Some(origin.as_str()) {
            self.set_active(list.last().map(String::as_str))?;
        }
        Ok(true)
    }

    /// Seeds the registry with configured origins without reordering
    /// existing entries.
    pub fn seed(&self, origins: &[String]) -> Result<()> {
        for origin in origins {
            self.append_if_absent(origin)?;
        }
        Ok(())
    }

    pub fn active(&self) -> Option<String> {
        self.store
            .get(ACTIVE_KEY)
            .map(|value| normalize_origin(&value))
            .filter(|value| !value.is_empty())
    }

    pub fn set_active(&self, origin: Option<&str>) -> Result<()> {
        let value = origin.map(normalize_origin).unwrap_or_default();
        self.store.set(ACTIVE_KEY, &value)
    }

    fn save(&self, list: &[String]) -> Result<()> {
        self.store.set(SERVICES_KEY, &serde_json::to_string(list)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn append_if_absent_keeps_order_and_uniqueness() -> Result<()> {
        let store = MemoryStore::new();
        let registry = ServiceRegistry::new(&store);

        assert!(registry.append_if_absent("https://a.example/")?);
        assert!(registry.append_if_absent("https://b.example")?);
        assert!(!registry.append_if_absent("https://a.example")?);
        assert!(!registry.append_if_absent("  ")?);

        assert_eq!(registry.list(), vec!["https://a.example", "https://b.example"]);
        assert!(registry.contains("https://b.example/"));
        Ok(())
    }

    #[test]
    fn removing_the_active_service_falls_back_to_the_last_entry() -> Result<()> {
        let store = MemoryStore::new();
        let registry = ServiceRegistry::new(&store);
        registry.seed(&[
            "https://a.example".to_string(),
            "https://b.example".to_string(),
            "https://c.example".to_string(),
        ])?;
        registry.set_active(Some("https://c.example"))?;

        assert!(registry.remove("https://c.example")?);
        assert_eq!(registry.active().as_deref(), Some("https://b.example"));

        assert!(!registry.remove("https://missing.example")?);
        registry.remove("https://a.example")?;
        registry.remove("https://b.example")?;
        assert_eq!(registry.active(), None);
        assert!(registry.list().is_empty());
        Ok(())
    }

    #[test]
    fn unreadable_list_is_treated_as_empty() -> Result<()> {
        let store = MemoryStore::new();
        store.set("services", "{broken")?;
        assert!(ServiceRegistry::new(&store).list().is_empty());
        Ok(())
    }
}
