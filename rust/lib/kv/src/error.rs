use thiserror::Error;

/// Errors from a [`LocalStorage`](crate::LocalStorage) backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
