//! Detail screen view model.

use crate::error::ValidationError;
use std::sync::Arc;
use todo_sync_core::{Todo, TodoDataService, TodoId};

/// Detail screen view model.
///
/// Holds only the id; the todo is looked up on every access so the screen
/// never shows a stale copy.
pub struct TodoDetailViewModel {
    service: Arc<dyn TodoDataService>,
    todo_id: TodoId,
}

impl TodoDetailViewModel {
    /// Create a view model for the todo with `todo_id`
    #[must_use]
    pub fn new(service: Arc<dyn TodoDataService>, todo_id: TodoId) -> Self {
        Self { service, todo_id }
    }

    /// Id of the displayed todo
    #[must_use]
    pub const fn todo_id(&self) -> &TodoId {
        &self.todo_id
    }

    /// The todo, if it still exists
    #[must_use]
    pub fn todo(&self) -> Option<Todo> {
        self.service.get(&self.todo_id)
    }

    /// Flip the completion flag, returning the updated todo
    pub fn toggle_completion(&self) -> Option<Todo> {
        let toggled = self.todo()?.toggled();
        self.service.update(toggled.clone()).then_some(toggled)
    }

    /// Change the title.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] if `title` is blank. Returns
    /// `Ok(None)` if the todo no longer exists.
    pub fn update_title(&self, title: &str) -> Result<Option<Todo>, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            tracing::warn!(id = %self.todo_id, "Rejected empty title");
            return Err(ValidationError::EmptyTitle);
        }
        let Some(current) = self.todo() else {
            return Ok(None);
        };
        let renamed = current.retitled(title);
        Ok(self.service.update(renamed.clone()).then_some(renamed))
    }

    /// Delete the todo
    pub fn delete(&self) -> Option<Todo> {
        self.service.delete_by_id(&self.todo_id)
    }
}
