//! One data service per stage.
//!
//! All services share [`ListCore`] for the list itself and differ only in
//! what happens after a mutation has been applied.

use crate::list::{SharedList, TodoList, default_titles};
use crate::metrics::record_mutation;
use todo_sync_core::{ServiceEnvironment, SyncStage, Todo, TodoChange, TodoId};

/// Stage 1: direct property access
pub mod property;

/// Stage 2: delegate registry
pub mod delegate;

/// Stage 3: single stored closure
pub mod closure;

/// Stage 4: typed broadcast bus
pub mod broadcast;

/// Stage 5: shared instance with statistics
pub mod shared;

/// Stage 6: persisted write-through cache
pub mod persisted;

/// Stage 7: reactive subjects
pub mod reactive;

pub use broadcast::BroadcastDataService;
pub use closure::ClosureDataService;
pub use delegate::DelegateDataService;
pub use persisted::{
    ACCESS_COUNT_KEY, BADGE_COUNT_KEY, CHANGE_COUNT_KEY, FIRST_LAUNCH_KEY, PersistedDataService,
    PersistenceStatistics, TODOS_KEY,
};
pub use property::PropertyDataService;
pub use reactive::{DEFAULT_UI_DEBOUNCE, ReactiveDataService, ReactiveStatistics};
pub use shared::{SharedDataService, SharedStatistics};

/// List storage, id assignment, logging and metrics common to every stage
pub(crate) struct ListCore {
    stage: SyncStage,
    env: ServiceEnvironment,
    todos: SharedList,
}

impl ListCore {
    pub(crate) const fn new(stage: SyncStage, env: ServiceEnvironment, list: TodoList) -> Self {
        Self {
            stage,
            env,
            todos: SharedList::new(list),
        }
    }

    pub(crate) fn seeded(stage: SyncStage, env: ServiceEnvironment) -> Self {
        let list = TodoList::seeded(env.ids.as_ref(), default_titles(stage));
        Self::new(stage, env, list)
    }

    pub(crate) const fn stage(&self) -> SyncStage {
        self.stage
    }

    pub(crate) const fn env(&self) -> &ServiceEnvironment {
        &self.env
    }

    pub(crate) fn snapshot(&self) -> Vec<Todo> {
        self.todos.snapshot()
    }

    pub(crate) fn len(&self) -> usize {
        self.todos.len()
    }

    pub(crate) fn replace_all(&self, list: TodoList) {
        self.todos.with(|current| *current = list);
    }

    pub(crate) fn add(&self, title: &str) -> TodoChange {
        let todo = Todo::new(self.env.ids.next_id(), title);
        let change = self.todos.with(|list| list.push(todo));
        record_mutation(self.stage, change.operation);
        tracing::debug!(
            stage = %self.stage,
            id = %change.todo.id,
            title = %change.todo.title,
            total = change.total,
            "Added todo"
        );
        change
    }

    pub(crate) fn delete(&self, id: &TodoId) -> Option<TodoChange> {
        let Some(change) = self.todos.with(|list| list.remove(id)) else {
            tracing::warn!(stage = %self.stage, id = %id, "Todo to delete not found");
            return None;
        };
        record_mutation(self.stage, change.operation);
        tracing::debug!(
            stage = %self.stage,
            id = %id,
            title = %change.todo.title,
            total = change.total,
            "Deleted todo"
        );
        Some(change)
    }

    pub(crate) fn update(&self, todo: Todo) -> Option<TodoChange> {
        let id = todo.id.clone();
        let Some(change) = self.todos.with(|list| list.replace(todo)) else {
            tracing::warn!(stage = %self.stage, id = %id, "Todo to update not found");
            return None;
        };
        record_mutation(self.stage, change.operation);
        tracing::debug!(
            stage = %self.stage,
            id = %id,
            title = %change.todo.title,
            completed = change.todo.completed,
            "Updated todo"
        );
        Some(change)
    }
}
