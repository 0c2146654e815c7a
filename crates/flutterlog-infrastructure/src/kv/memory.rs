//! In-memory key-value backend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use flutterlog_core::error::{FlutterlogError, Result};
use flutterlog_core::kv::KeyValueStore;

/// A process-local key-value store.
///
/// Clones share the same underlying map, so one handle can be given to a
/// `HistoryStore` while another inspects what was written. Nothing survives
/// the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self
            .entries
            .read()
            .map_err(|_| FlutterlogError::storage_read(key, "memory store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| FlutterlogError::persistence(key, "memory store lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| FlutterlogError::persistence(key, "memory store lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_remove() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("history:alice").unwrap(), None);

        store.set("history:alice", "[]").unwrap();
        assert_eq!(store.get("history:alice").unwrap().as_deref(), Some("[]"));

        store.remove("history:alice").unwrap();
        assert!(store.is_empty());

        // removing an absent key is fine
        store.remove("history:alice").unwrap();
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryKeyValueStore::new();
        let other = store.clone();

        other.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
    }
}
