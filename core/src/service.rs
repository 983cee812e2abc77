//! The data service contract shared by every stage.
//!
//! A data service owns the in-memory todo list. All stages expose the same
//! CRUD operations; they differ only in how a change reaches whoever is
//! interested in it:
//!
//! | Stage | Propagation              | Badge                 |
//! |-------|--------------------------|-----------------------|
//! | 1     | none                     | never updates         |
//! | 2     | observer registry        | never updates         |
//! | 3     | single callback          | never updates         |
//! | 4     | typed event bus          | counts additions      |
//! | 5     | shared instance + bus    | counts additions      |
//! | 6     | persisted cache + bus    | counts, persisted     |
//! | 7     | reactive subjects        | derived from adds     |
//!
//! # Dyn Compatibility
//!
//! The trait is object safe so the container can hand out
//! `Arc<dyn TodoDataService>` regardless of the configured stage.

use crate::event::TodoChange;
use crate::stage::SyncStage;
use crate::todo::{Todo, TodoId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Handle returned by every registration, used to release it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Wraps a raw handle value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callback receiving the current badge value
pub type BadgeCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// A consumer interested in list changes.
///
/// Observers are held by the service until explicitly unbound; they must not
/// hold a strong reference back to the service's owner.
pub trait ChangeObserver: Send + Sync {
    /// Called after a mutation has been applied
    fn todos_changed(&self, change: &TodoChange);
}

impl<F> ChangeObserver for F
where
    F: Fn(&TodoChange) + Send + Sync,
{
    fn todos_changed(&self, change: &TodoChange) {
        self(change);
    }
}

/// CRUD over the in-memory todo list plus stage-specific change propagation.
///
/// Mutations are synchronous and never fail. Lookup misses (`delete_by_id`,
/// `update` with an unknown id) are silent no-ops reported through the
/// return value.
pub trait TodoDataService: Send + Sync {
    /// Stage implemented by this service
    fn stage(&self) -> SyncStage;

    /// Snapshot of all todos in insertion order
    fn list(&self) -> Vec<Todo>;

    /// Append a new todo with a fresh identifier and return it
    fn add(&self, title: &str) -> Todo;

    /// Remove the todo with `id`, returning it if it existed
    fn delete_by_id(&self, id: &TodoId) -> Option<Todo>;

    /// Replace the todo with the same id; returns `false` if none matched
    fn update(&self, todo: Todo) -> bool;

    /// Register a change consumer using this stage's technique
    fn bind_consumer(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId;

    /// Release a binding made with [`bind_consumer`](Self::bind_consumer)
    fn unbind_consumer(&self, id: ObserverId);

    /// Tear down every binding, subscription and pipeline of the service
    fn dispose(&self);

    /// Subscribe to badge changes.
    ///
    /// Badge-capable stages call `callback` immediately with the current value
    /// and again on every change. Other stages return `None`.
    fn subscribe_badge(&self, callback: BadgeCallback) -> Option<ObserverId> {
        let _ = callback;
        None
    }

    /// Release a badge subscription
    fn unsubscribe_badge(&self, id: ObserverId) {
        let _ = id;
    }

    /// Reset the badge to zero
    fn clear_badge(&self) {}

    /// Current badge value
    fn badge_count(&self) -> usize {
        0
    }

    /// Look up a single todo by id
    fn get(&self, id: &TodoId) -> Option<Todo> {
        self.list().into_iter().find(|todo| &todo.id == id)
    }
}
