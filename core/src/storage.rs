//! Key-value storage abstraction for the persisted stage.
//!
//! The persisted stage writes its list, counters and badge through a
//! [`KeyValueStore`]. Values are strings; the service chooses the encoding
//! (JSON for the list, decimal text for counters, RFC 3339 for timestamps).
//!
//! # Implementations
//!
//! - `InMemoryKeyValueStore` (testing crate) - for tests and restarts simulated in-process
//! - `FileKeyValueStore` (runtime crate) - one JSON object file on disk

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing medium failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded for storage
    #[error("Failed to encode value for key '{key}': {reason}")]
    Encode {
        /// Key being written
        key: String,
        /// Underlying reason
        reason: String,
    },

    /// A stored value could not be decoded
    #[error("Failed to decode value for key '{key}': {reason}")]
    Decode {
        /// Key being read
        key: String,
        /// Underlying reason
        reason: String,
    },

    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Synchronous string key-value store.
///
/// Implementations must be `Send + Sync`; the persisted service may be shared
/// across threads through the container.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` if present
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;

    /// Force buffered writes to the backing medium
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if flushing fails.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Size in bytes of the value stored under `key`, 0 if absent
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn size_of(&self, key: &str) -> Result<usize> {
        Ok(self.get(key)?.map_or(0, |value| value.len()))
    }
}
