//! Client-side key/value storage.
//!
//! A string-to-string store with the same shape as browser `localStorage`,
//! used for the denormalized user mirror and the persisted auth session.
//!
//! - [`MemoryStorage`] keeps everything in process memory.
//! - [`RedbStorage`] persists to an embedded redb file.

pub mod error;
pub mod memory;
pub mod redb;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use redb::RedbStorage;
pub use traits::{JsonStorage, LocalStorage};
