//! View models for the list, detail and add screens.
//!
//! They sit between screens and a [`TodoDataService`](todo_sync_core::TodoDataService)
//! and own every binding they make, releasing it when dropped.

mod add;
mod detail;
mod list;

pub use add::AddTodoViewModel;
pub use detail::TodoDetailViewModel;
pub use list::{CallbackTodoListViewModel, ReactiveTodoListViewModel, TodoListViewModel};
