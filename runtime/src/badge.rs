//! Badge counter used by the broadcast, shared and persisted stages.

use crate::registry::Registry;
use std::sync::atomic::{AtomicUsize, Ordering};
use todo_sync_core::{BadgeCallback, ObserverId};

/// Unseen-additions counter with callback subscribers
#[derive(Default)]
pub struct BadgeCounter {
    count: AtomicUsize,
    callbacks: Registry<BadgeCallback>,
}

impl BadgeCounter {
    /// Create a counter starting at `initial`
    #[must_use]
    pub const fn new(initial: usize) -> Self {
        Self {
            count: AtomicUsize::new(initial),
            callbacks: Registry::new(),
        }
    }

    /// Current value
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Add one and notify; returns the new value
    pub fn increment(&self) -> usize {
        let next = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        self.notify(next);
        next
    }

    /// Reset to zero and notify; returns the previous value
    pub fn clear(&self) -> usize {
        let previous = self.count.swap(0, Ordering::SeqCst);
        self.notify(0);
        previous
    }

    /// Register `callback`; it is invoked immediately with the current value
    pub fn subscribe(&self, callback: BadgeCallback) -> ObserverId {
        callback(self.count());
        self.callbacks.insert(callback)
    }

    /// Release a subscription
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.callbacks.remove(id).is_some()
    }

    /// Release every subscription
    pub fn unsubscribe_all(&self) -> usize {
        self.callbacks.clear()
    }

    /// Number of subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.callbacks.len()
    }

    fn notify(&self, value: usize) {
        for callback in self.callbacks.snapshot() {
            callback(value);
        }
    }
}

impl std::fmt::Debug for BadgeCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeCounter")
            .field("count", &self.count())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, PoisonError};

    #[test]
    fn subscribers_see_current_then_changes() {
        let badge = BadgeCounter::new(2);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = badge.subscribe(Arc::new(move |n: usize| {
            sink.lock().unwrap_or_else(PoisonError::into_inner).push(n);
        }));

        badge.increment();
        assert_eq!(badge.clear(), 3);
        badge.unsubscribe(id);
        badge.increment();

        assert_eq!(
            *seen.lock().unwrap_or_else(PoisonError::into_inner),
            vec![2, 3, 0]
        );
        assert_eq!(badge.count(), 1);
    }
}
