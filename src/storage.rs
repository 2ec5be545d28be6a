// 🗄️ Key-Value Storage - where the allocation record is mirrored
//
// The in-memory state is authoritative; storage is only read at startup.
// Every backend is best-effort: callers log failures and carry on.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite storage failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store holding serialized state.
pub trait KeyValueStore {
    /// Previously saved value, `None` if nothing was stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the entry entirely. Erasing a missing key is not an error.
    fn erase(&self, key: &str) -> Result<()>;

    /// When `key` was last written, if the backend tracks it.
    fn last_saved(&self, _key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }

    fn erase(&self, key: &str) -> Result<()> {
        (**self).erase(key)
    }

    fn last_saved(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        (**self).last_saved(key)
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, (String, DateTime<Utc>)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("memory store lock poisoned".to_string())
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), (value.to_string(), Utc::now()));
        Ok(())
    }

    fn erase(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn last_saved(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).map(|(_, saved_at)| *saved_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_save_load_erase() {
        let store = MemoryStore::new();
        assert_eq!(store.load("k").unwrap(), None);

        store.save("k", "v1").unwrap();
        store.save("k", "v2").unwrap();
        assert_eq!(store.load("k").unwrap(), Some("v2".to_string()));
        assert!(store.last_saved("k").unwrap().is_some());
        assert_eq!(store.len(), 1);

        store.erase("k").unwrap();
        assert_eq!(store.load("k").unwrap(), None);
        assert!(store.is_empty());

        // erasing twice is fine
        store.erase("k").unwrap();
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();

        handle.save("shared", "yes").unwrap();
        assert_eq!(store.load("shared").unwrap(), Some("yes".to_string()));
    }

    #[test]
    fn test_boxed_store_delegates() {
        let inner = MemoryStore::new();
        let boxed: Box<dyn KeyValueStore> = Box::new(inner.clone());

        boxed.save("k", "boxed").unwrap();
        assert_eq!(inner.load("k").unwrap(), Some("boxed".to_string()));
        assert!(boxed.last_saved("k").unwrap().is_some());
    }
}
