//! Stage 3: a single stored callback.
//!
//! Binding installs the callback; binding again replaces it. Unbinding only
//! clears the slot if the handle still owns it.

use super::ListCore;
use crate::list::TodoList;
use crate::registry::next_observer_id;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use todo_sync_core::{
    ChangeObserver, ObserverId, ServiceEnvironment, SyncStage, Todo, TodoChange, TodoDataService,
    TodoId,
};

type ChangeCallback = Arc<dyn Fn(&TodoChange) + Send + Sync>;

/// Data service with one callback slot
pub struct ClosureDataService {
    core: ListCore,
    on_change: Mutex<Option<(ObserverId, ChangeCallback)>>,
}

impl ClosureDataService {
    /// Create the service with the stage's default todos
    #[must_use]
    pub fn new(env: ServiceEnvironment) -> Self {
        let service = Self {
            core: ListCore::seeded(SyncStage::Stage3, env),
            on_change: Mutex::new(None),
        };
        tracing::info!(stage = %SyncStage::Stage3, count = service.core.len(), "Closure data service ready");
        service
    }

    /// Create the service with explicit starting todos
    #[must_use]
    pub fn with_todos(env: ServiceEnvironment, todos: Vec<Todo>) -> Self {
        Self {
            core: ListCore::new(SyncStage::Stage3, env, TodoList::new(todos)),
            on_change: Mutex::new(None),
        }
    }

    /// Whether a callback is installed
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<(ObserverId, ChangeCallback)>> {
        self.on_change.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trigger(&self, change: &TodoChange) {
        let callback = self.slot().as_ref().map(|(_, callback)| Arc::clone(callback));
        match callback {
            Some(callback) => {
                callback(change);
                tracing::debug!(stage = %self.stage(), operation = %change.operation, "Change callback executed");
            }
            None => {
                tracing::debug!(stage = %self.stage(), operation = %change.operation, "No change callback installed");
            }
        }
    }
}

impl TodoDataService for ClosureDataService {
    fn stage(&self) -> SyncStage {
        self.core.stage()
    }

    fn list(&self) -> Vec<Todo> {
        self.core.snapshot()
    }

    fn add(&self, title: &str) -> Todo {
        let change = self.core.add(title);
        self.trigger(&change);
        change.todo
    }

    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        let change = self.core.delete(id)?;
        self.trigger(&change);
        Some(change.todo)
    }

    fn update(&self, todo: Todo) -> bool {
        let Some(change) = self.core.update(todo) else {
            return false;
        };
        self.trigger(&change);
        true
    }

    fn bind_consumer(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        let id = next_observer_id();
        let callback: ChangeCallback = Arc::new(move |change: &TodoChange| observer.todos_changed(change));
        if let Some((previous, _)) = self.slot().replace((id, callback)) {
            tracing::debug!(stage = %self.stage(), previous = %previous, "Replaced change callback");
        }
        tracing::debug!(stage = %self.stage(), observer = %id, "Change callback installed");
        id
    }

    fn unbind_consumer(&self, id: ObserverId) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|(owner, _)| *owner == id) {
            *slot = None;
            tracing::debug!(stage = %self.stage(), observer = %id, "Change callback removed");
        }
    }

    fn dispose(&self) {
        self.slot().take();
        tracing::debug!(stage = %self.stage(), "Change callback cleared");
    }
}
