//! The in-memory list every data service wraps.
//!
//! The stages only differ in how they announce changes; the array
//! operations themselves (append, remove by id, replace by id) live here
//! once.

use std::sync::{Mutex, MutexGuard, PoisonError};
use todo_sync_core::{IdGenerator, Operation, SyncStage, Todo, TodoChange, TodoId};

/// Ordered list of todos with unique ids
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoList {
    items: Vec<Todo>,
}

impl TodoList {
    /// Wrap existing todos
    #[must_use]
    pub const fn new(items: Vec<Todo>) -> Self {
        Self { items }
    }

    /// Build a list from titles, drawing ids from `ids`
    #[must_use]
    pub fn seeded(ids: &dyn IdGenerator, titles: &[&str]) -> Self {
        Self::new(
            titles
                .iter()
                .map(|title| Todo::new(ids.next_id(), *title))
                .collect(),
        )
    }

    /// Borrow the todos
    #[must_use]
    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    /// Number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a todo by id
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.items.iter().find(|todo| &todo.id == id)
    }

    /// Append a todo
    pub fn push(&mut self, todo: Todo) -> TodoChange {
        self.items.push(todo.clone());
        TodoChange::new(Operation::Add, todo, self.items.len())
    }

    /// Remove the todo with `id`; `None` if absent
    pub fn remove(&mut self, id: &TodoId) -> Option<TodoChange> {
        let index = self.items.iter().position(|todo| &todo.id == id)?;
        let removed = self.items.remove(index);
        Some(TodoChange::new(Operation::Delete, removed, self.items.len()))
    }

    /// Replace the todo with the same id; `None` if absent
    pub fn replace(&mut self, todo: Todo) -> Option<TodoChange> {
        let slot = self.items.iter_mut().find(|existing| existing.id == todo.id)?;
        slot.clone_from(&todo);
        Some(TodoChange::new(Operation::Update, todo, self.items.len()))
    }

    /// Drop every todo
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Consume into the underlying vector
    #[must_use]
    pub fn into_vec(self) -> Vec<Todo> {
        self.items
    }
}

/// A [`TodoList`] behind a mutex.
///
/// Callers mutate inside [`with`](Self::with) and notify after it returns,
/// so no callback ever runs while the lock is held.
#[derive(Debug, Default)]
pub struct SharedList {
    inner: Mutex<TodoList>,
}

impl SharedList {
    /// Wrap a list
    #[must_use]
    pub const fn new(list: TodoList) -> Self {
        Self {
            inner: Mutex::new(list),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TodoList> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut TodoList) -> R) -> R {
        f(&mut self.lock())
    }

    /// Clone the todos
    #[must_use]
    pub fn snapshot(&self) -> Vec<Todo> {
        self.lock().items().to_vec()
    }

    /// Number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Titles each stage starts with
#[must_use]
pub const fn default_titles(stage: SyncStage) -> &'static [&'static str] {
    match stage {
        SyncStage::Stage1 => &[
            "Learn data passing",
            "Finish the Todo app project",
            "Prepare an interview portfolio",
        ],
        SyncStage::Stage2 => &[
            "Learn the delegate pattern",
            "Implement view model communication",
            "Test automatic data sync",
        ],
        SyncStage::Stage3 => &[
            "Learn the closure pattern",
            "Understand callback mechanics",
            "Avoid extending external types",
        ],
        SyncStage::Stage4 => &[
            "Learn the event bus",
            "Get real automatic UI updates",
            "Try one-to-many notification",
        ],
        SyncStage::Stage5 => &[
            "Learn the shared instance pattern",
            "Understand global state management",
            "Observe memory-resident state",
        ],
        SyncStage::Stage6 => &[
            "Learn write-through persistence",
            "Keep data across restarts",
            "Understand local storage",
            "Enjoy a persisted badge",
        ],
        SyncStage::Stage7 | SyncStage::Stage8 => &[
            "Learn publisher concepts",
            "Understand subscriptions",
            "Experience reactive data flow",
        ],
    }
}
