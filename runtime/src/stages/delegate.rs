//! Stage 2: observers registered by handle, notified after every mutation.
//!
//! The registry keeps observers until they are unbound explicitly. The list
//! view model only logs what it hears, so screens still refresh on their
//! own.

use super::ListCore;
use crate::list::TodoList;
use crate::registry::Registry;
use std::sync::Arc;
use todo_sync_core::{
    ChangeObserver, ObserverId, ServiceEnvironment, SyncStage, Todo, TodoChange, TodoDataService,
    TodoId,
};

/// Data service with a delegate registry
pub struct DelegateDataService {
    core: ListCore,
    observers: Registry<Arc<dyn ChangeObserver>>,
}

impl DelegateDataService {
    /// Create the service with the stage's default todos
    #[must_use]
    pub fn new(env: ServiceEnvironment) -> Self {
        let service = Self {
            core: ListCore::seeded(SyncStage::Stage2, env),
            observers: Registry::new(),
        };
        tracing::info!(stage = %SyncStage::Stage2, count = service.core.len(), "Delegate data service ready");
        service
    }

    /// Create the service with explicit starting todos
    #[must_use]
    pub fn with_todos(env: ServiceEnvironment, todos: Vec<Todo>) -> Self {
        Self {
            core: ListCore::new(SyncStage::Stage2, env, TodoList::new(todos)),
            observers: Registry::new(),
        }
    }

    /// Number of registered observers
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&self, change: &TodoChange) {
        let observers = self.observers.snapshot();
        for observer in &observers {
            observer.todos_changed(change);
        }
        tracing::debug!(
            stage = %self.stage(),
            operation = %change.operation,
            observers = observers.len(),
            "Notified delegates"
        );
    }
}

impl TodoDataService for DelegateDataService {
    fn stage(&self) -> SyncStage {
        self.core.stage()
    }

    fn list(&self) -> Vec<Todo> {
        self.core.snapshot()
    }

    fn add(&self, title: &str) -> Todo {
        let change = self.core.add(title);
        self.notify(&change);
        change.todo
    }

    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        let change = self.core.delete(id)?;
        self.notify(&change);
        Some(change.todo)
    }

    fn update(&self, todo: Todo) -> bool {
        let Some(change) = self.core.update(todo) else {
            return false;
        };
        self.notify(&change);
        true
    }

    fn bind_consumer(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        let id = self.observers.insert(observer);
        tracing::debug!(stage = %self.stage(), observer = %id, total = self.observers.len(), "Registered delegate");
        id
    }

    fn unbind_consumer(&self, id: ObserverId) {
        if self.observers.remove(id).is_some() {
            tracing::debug!(stage = %self.stage(), observer = %id, "Unregistered delegate");
        }
    }

    fn dispose(&self) {
        let removed = self.observers.clear();
        tracing::debug!(stage = %self.stage(), removed, "Disposed delegates");
    }
}
