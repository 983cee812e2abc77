//! Handle-keyed subscriber registry.
//!
//! Every notification mechanism in this crate (delegate observers, badge
//! callbacks, topic handlers, subject subscribers) stores its entries here.
//! Entries are released explicitly by handle; nothing relies on weak
//! references going stale.
//!
//! Notification always works on a [`snapshot`](Registry::snapshot) taken
//! under the lock, so a callback may register, unregister or publish without
//! deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use todo_sync_core::ObserverId;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique handle
pub fn next_observer_id() -> ObserverId {
    ObserverId::new(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Ordered list of entries keyed by [`ObserverId`]
#[derive(Debug)]
pub struct Registry<T> {
    entries: Mutex<Vec<(ObserverId, T)>>,
}

impl<T> Registry<T> {
    /// Create an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ObserverId, T)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an entry and return its handle
    pub fn insert(&self, entry: T) -> ObserverId {
        let id = next_observer_id();
        self.lock().push((id, entry));
        id
    }

    /// Remove the entry with `id`, returning it if present
    pub fn remove(&self, id: ObserverId) -> Option<T> {
        let mut entries = self.lock();
        let index = entries.iter().position(|(entry_id, _)| *entry_id == id)?;
        Some(entries.remove(index).1)
    }

    /// Whether an entry with `id` is registered
    pub fn contains(&self, id: ObserverId) -> bool {
        self.lock().iter().any(|(entry_id, _)| *entry_id == id)
    }

    /// Drop every entry, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no entries are registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T: Clone> Registry<T> {
    /// Clone all entries in registration order
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().iter().map(|(_, entry)| entry.clone()).collect()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
