//! Add screen view model.

use crate::error::ValidationError;
use std::sync::Arc;
use todo_sync_core::{Todo, TodoDataService};

/// Add screen view model
pub struct AddTodoViewModel {
    service: Arc<dyn TodoDataService>,
}

impl AddTodoViewModel {
    /// Create a view model adding to `service`
    #[must_use]
    pub fn new(service: Arc<dyn TodoDataService>) -> Self {
        Self { service }
    }

    /// Add a todo with the trimmed `title`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] if `title` is blank; nothing
    /// is added.
    pub fn add_todo(&self, title: &str) -> Result<Todo, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            tracing::warn!(stage = %self.service.stage(), "Rejected empty title");
            return Err(ValidationError::EmptyTitle);
        }
        Ok(self.service.add(title))
    }
}
