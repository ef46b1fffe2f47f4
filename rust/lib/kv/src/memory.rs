use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StorageError;
use crate::traits::LocalStorage;

/// MemoryStorage keeps all entries in a process-local `BTreeMap`.
///
/// Nothing survives a restart. Used by tests and by short-lived clients
/// that do not need a persistent mirror.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Storage("memory storage lock poisoned".to_string())
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::JsonStorage;

    // ========================================================================
    // Basic get/set/remove
    // ========================================================================

    #[test]
    fn set_and_get() {
        let storage = MemoryStorage::new();
        storage.set_item("userData", "{}").unwrap();
        assert_eq!(storage.get_item("userData").unwrap(), Some("{}".to_string()));
    }

    #[test]
    fn get_missing_returns_none() {
        let storage = MemoryStorage::new();
        assert!(storage.get_item("nothing").unwrap().is_none());
    }

    #[test]
    fn set_overwrites() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "1").unwrap();
        storage.set_item("k", "2").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), Some("2".to_string()));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn remove_existing_and_missing() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v").unwrap();
        storage.remove_item("k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());

        // Second remove is a no-op.
        storage.remove_item("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn keys_are_sorted() {
        let storage = MemoryStorage::new();
        storage.set_item("b", "").unwrap();
        storage.set_item("a", "").unwrap();
        storage.set_item("c", "").unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["a", "b", "c"]);
    }

    // ========================================================================
    // JSON helpers
    // ========================================================================

    #[test]
    fn json_store_and_load() {
        let storage = MemoryStorage::new();
        let doc = serde_json::json!({"id": "u1", "role": "client"});
        storage.store_json("userData", &doc).unwrap();

        let back: serde_json::Value = storage.load_json("userData").unwrap().unwrap();
        assert_eq!(back["role"], "client");
    }

    #[test]
    fn json_load_missing_is_none() {
        let storage = MemoryStorage::new();
        let back: Option<serde_json::Value> = storage.load_json("userData").unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn json_load_garbage_is_serialization_error() {
        let storage = MemoryStorage::new();
        storage.set_item("userData", "not json").unwrap();
        let err = storage.load_json::<serde_json::Value>("userData").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn usable_as_trait_object() {
        let storage: Box<dyn LocalStorage> = Box::new(MemoryStorage::new());
        storage.store_json("n", &42u32).unwrap();
        assert_eq!(storage.load_json::<u32>("n").unwrap(), Some(42));
    }
}
