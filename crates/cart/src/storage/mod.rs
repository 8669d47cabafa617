//! Device-local key-value storage.
//!
//! The cart only needs string values under string keys, read once at startup
//! and overwritten after every mutation. [`KeyValueStore`] is that contract;
//! implementations decide where the bytes live.
//!
//! - [`MemoryStore`] - In-process map for tests and embedding
//! - [`FileStore`] - One JSON file on disk holding every key

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data exists but cannot be read as a key-value map.
    #[error("Corrupt storage: {0}")]
    Corrupt(String),

    /// The backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`.
    ///
    /// Returns `Ok(())` even if the key did not exist.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
