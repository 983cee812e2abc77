//! Stage 1: the list is read directly, nothing is announced.
//!
//! Consumers see changes only when they fetch again. Bindings are accepted
//! so the container can treat every stage alike, but they are never called.

use super::ListCore;
use crate::list::TodoList;
use crate::registry::next_observer_id;
use std::sync::Arc;
use todo_sync_core::{
    ChangeObserver, ObserverId, ServiceEnvironment, SyncStage, Todo, TodoDataService, TodoId,
};

/// Data service without change propagation
pub struct PropertyDataService {
    core: ListCore,
}

impl PropertyDataService {
    /// Create the service with the stage's default todos
    #[must_use]
    pub fn new(env: ServiceEnvironment) -> Self {
        let service = Self {
            core: ListCore::seeded(SyncStage::Stage1, env),
        };
        tracing::info!(stage = %SyncStage::Stage1, count = service.core.len(), "Property data service ready");
        service
    }

    /// Create the service with explicit starting todos
    #[must_use]
    pub fn with_todos(env: ServiceEnvironment, todos: Vec<Todo>) -> Self {
        Self {
            core: ListCore::new(SyncStage::Stage1, env, TodoList::new(todos)),
        }
    }
}

impl TodoDataService for PropertyDataService {
    fn stage(&self) -> SyncStage {
        self.core.stage()
    }

    fn list(&self) -> Vec<Todo> {
        self.core.snapshot()
    }

    fn add(&self, title: &str) -> Todo {
        self.core.add(title).todo
    }

    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        self.core.delete(id).map(|change| change.todo)
    }

    fn update(&self, todo: Todo) -> bool {
        self.core.update(todo).is_some()
    }

    fn bind_consumer(&self, _observer: Arc<dyn ChangeObserver>) -> ObserverId {
        tracing::debug!(stage = %self.stage(), "No data binding needed");
        next_observer_id()
    }

    fn unbind_consumer(&self, _id: ObserverId) {}

    fn dispose(&self) {
        tracing::debug!(stage = %self.stage(), "Nothing to dispose");
    }
}
