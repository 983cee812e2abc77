//! In-memory storage and observer doubles
//!
//! - [`InMemoryKeyValueStore`]: HashMap-based key-value storage that can be
//!   shared between two services to simulate a restart
//! - [`RecordingObserver`]: remembers every change it was told about

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use todo_sync_core::{
    ChangeObserver, KeyValueStore, Operation, StorageError, StorageResult, TodoChange,
};

/// In-memory key-value store for fast, deterministic testing.
///
/// Clones share the same map, so a second service opened on a clone sees
/// exactly what the first one wrote.
///
/// # Example
///
/// ```
/// use todo_sync_testing::InMemoryKeyValueStore;
/// use todo_sync_core::KeyValueStore;
///
/// let store = InMemoryKeyValueStore::new();
/// store.set("greeting", "hello").unwrap();
///
/// let same = store.clone();
/// assert_eq!(same.get("greeting").unwrap().as_deref(), Some("hello"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryKeyValueStore {
    data: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `entries`
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut data = store.data.write().unwrap();
            for (key, value) in entries {
                data.insert((*key).to_string(), (*value).to_string());
            }
        }
        store
    }

    /// Make every subsequent `set` and `remove` fail with a backend error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Clear all data (for test isolation)
    pub fn clear(&self) {
        self.data.write().unwrap().clear();
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().unwrap().is_empty()
    }

    /// Check if a key exists in the store
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().unwrap().contains_key(key)
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("writes disabled for test".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.data.write().unwrap().remove(key);
        Ok(())
    }
}

/// Observer that records every change
#[derive(Debug, Default)]
pub struct RecordingObserver {
    changes: Mutex<Vec<TodoChange>>,
}

impl RecordingObserver {
    /// Create a shareable recorder
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Everything recorded so far
    #[must_use]
    pub fn changes(&self) -> Vec<TodoChange> {
        self.changes.lock().unwrap().clone()
    }

    /// Operations recorded so far
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .map(|change| change.operation)
            .collect()
    }

    /// Number of recorded changes
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.lock().unwrap().len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.lock().unwrap().is_empty()
    }
}

impl ChangeObserver for RecordingObserver {
    fn todos_changed(&self, change: &TodoChange) {
        self.changes.lock().unwrap().push(change.clone());
    }
}
