use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// LocalStorage is a flat string key/value store scoped to one client.
///
/// Keys are opaque strings (`userData`, `salon.auth.session`). Values are
/// usually serialized JSON documents, see [`JsonStorage`].
pub trait LocalStorage: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set a key-value pair, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// JSON helpers on top of any [`LocalStorage`].
pub trait JsonStorage {
    /// Read and decode the JSON document stored at `key`.
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;

    /// Encode `value` as JSON and store it at `key`.
    fn store_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError>;
}

impl<S: LocalStorage + ?Sized> JsonStorage for S {
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    fn store_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;
        self.set_item(key, &raw)
    }
}
