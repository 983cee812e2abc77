//! # Todo Stages Demo
//!
//! Headless screens driving the todo-sync view models.
//!
//! There is no rendering here. Each screen keeps what it would display and
//! turns it into text, so a scripted [`Session`] can show how the configured
//! stage propagates changes:
//! - [`ListScreen`] re-fetches on every appearance and clears the badge
//! - [`AddScreen`] and [`DetailScreen`] mutate through their view models
//! - [`TabBar`] shows the badge of unseen additions
//!
//! ## Example
//!
//! ```no_run
//! use todo_stages::Session;
//! use todo_sync_runtime::{ContainerConfig, ServiceContainer};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let container = ServiceContainer::builder(ContainerConfig::default()).build()?;
//! let mut session = Session::new(container);
//! for line in session.run_script(Duration::from_millis(120)).await {
//!     println!("{line}");
//! }
//! session.shutdown();
//! # Ok(())
//! # }
//! ```

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use todo_sync_core::{BadgeCallback, Todo, TodoId, UiUpdate};
use todo_sync_runtime::{
    AddTodoViewModel, ServiceContainer, TodoDetailViewModel, TodoListViewModel, ValidationError,
};

/// Tab bar item of the list screen
#[derive(Debug, Default)]
pub struct TabBar {
    badge: Arc<AtomicUsize>,
}

impl TabBar {
    /// Tab bar with no badge
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that keeps this tab bar's badge current
    #[must_use]
    pub fn badge_handler(&self) -> BadgeCallback {
        let badge = Arc::clone(&self.badge);
        Arc::new(move |count: usize| badge.store(count, Ordering::SeqCst))
    }

    /// Badge value, hidden at zero
    #[must_use]
    pub fn badge(&self) -> Option<usize> {
        match self.badge.load(Ordering::SeqCst) {
            0 => None,
            count => Some(count),
        }
    }

    /// Tab title as shown
    #[must_use]
    pub fn label(&self) -> String {
        self.badge()
            .map_or_else(|| "Todos".to_string(), |count| format!("Todos ({count})"))
    }
}

/// The list screen
pub struct ListScreen {
    view_model: Box<dyn TodoListViewModel>,
    rows: Vec<Todo>,
    visible: bool,
    reloads: usize,
}

impl ListScreen {
    /// Create the screen and attach its badge to `tab_bar`
    #[must_use]
    pub fn new(view_model: Box<dyn TodoListViewModel>, tab_bar: &TabBar) -> Self {
        view_model.set_badge_update_handler(tab_bar.badge_handler());
        Self {
            view_model,
            rows: Vec::new(),
            visible: false,
            reloads: 0,
        }
    }

    /// The screen becomes visible: re-fetch and mark the badge as seen
    pub fn appear(&mut self) {
        self.visible = true;
        self.reload();
        self.view_model.mark_badge_as_viewed();
    }

    /// Another screen covers this one
    pub fn disappear(&mut self) {
        self.visible = false;
    }

    /// Whether the screen is on top
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    fn reload(&mut self) {
        self.rows = self.view_model.todos();
        self.reloads += 1;
        tracing::debug!(rows = self.rows.len(), reloads = self.reloads, "List reloaded");
    }

    /// Drain pending UI updates; a visible screen reloads once if any arrived.
    ///
    /// Returns the number of updates taken from `updates`.
    pub fn apply_updates(&mut self, updates: &mut broadcast::Receiver<UiUpdate>) -> usize {
        let mut received = 0;
        loop {
            match updates.try_recv() {
                Ok(update) => {
                    received += 1;
                    tracing::debug!(operation = %update.operation, count = update.count, "UI update received");
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    received += usize::try_from(skipped).unwrap_or(usize::MAX);
                    tracing::warn!(skipped, "UI updates dropped, reloading anyway");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if received > 0 && self.visible {
            self.reload();
        }
        received
    }

    /// Rows as last fetched
    #[must_use]
    pub fn rows(&self) -> &[Todo] {
        &self.rows
    }

    /// How often the rows were re-fetched
    #[must_use]
    pub const fn reloads(&self) -> usize {
        self.reloads
    }

    /// Id of the row at `index`, for opening its detail screen
    #[must_use]
    pub fn select(&self, index: usize) -> Option<TodoId> {
        self.rows.get(index).map(|todo| todo.id.clone())
    }

    /// Swipe-to-delete the row at `index`
    pub fn delete_at(&mut self, index: usize) -> Option<Todo> {
        let removed = self.view_model.delete_at(index)?;
        self.reload();
        Some(removed)
    }

    /// Tap the checkbox of the row at `index`
    pub fn toggle_at(&mut self, index: usize) -> Option<Todo> {
        let toggled = self.view_model.toggle_completion_at(index)?;
        self.reload();
        Some(toggled)
    }

    /// The view model behind the screen
    #[must_use]
    pub fn view_model(&self) -> &dyn TodoListViewModel {
        self.view_model.as_ref()
    }

    /// One line per row
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, todo) in self.rows.iter().enumerate() {
            let mark = if todo.completed { 'x' } else { ' ' };
            let _ = writeln!(out, "{:>2}. [{mark}] {}", index + 1, todo.title);
        }
        out
    }
}

/// The detail screen of one todo
pub struct DetailScreen {
    view_model: TodoDetailViewModel,
}

impl DetailScreen {
    /// Wrap a detail view model
    #[must_use]
    pub const fn new(view_model: TodoDetailViewModel) -> Self {
        Self { view_model }
    }

    /// Flip the completion switch
    pub fn toggle(&self) -> Option<Todo> {
        self.view_model.toggle_completion()
    }

    /// Save an edited title.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] for a blank title.
    pub fn rename(&self, title: &str) -> Result<Option<Todo>, ValidationError> {
        self.view_model.update_title(title)
    }

    /// Delete the todo
    pub fn delete(&self) -> Option<Todo> {
        self.view_model.delete()
    }

    /// Title and state, or a note that the todo is gone
    #[must_use]
    pub fn render(&self) -> String {
        self.view_model.todo().map_or_else(
            || format!("Todo {} no longer exists", self.view_model.todo_id()),
            |todo| {
                let state = if todo.completed { "done" } else { "open" };
                format!("{} ({state})", todo.title)
            },
        )
    }
}

/// The add screen
pub struct AddScreen {
    view_model: AddTodoViewModel,
}

impl AddScreen {
    /// Wrap an add view model
    #[must_use]
    pub const fn new(view_model: AddTodoViewModel) -> Self {
        Self { view_model }
    }

    /// Press save with `title` typed in
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] for a blank title.
    pub fn submit(&self, title: &str) -> Result<Todo, ValidationError> {
        self.view_model.add_todo(title)
    }
}

/// All screens of one run, wired to one container
pub struct Session {
    container: ServiceContainer,
    tab_bar: TabBar,
    list: ListScreen,
    add: AddScreen,
    updates: broadcast::Receiver<UiUpdate>,
}

impl Session {
    /// Build the screens for `container`
    #[must_use]
    pub fn new(container: ServiceContainer) -> Self {
        let tab_bar = TabBar::new();
        let list = ListScreen::new(container.create_list_view_model(), &tab_bar);
        let add = AddScreen::new(container.create_add_view_model());
        let updates = container.event_bus().ui_updates().listen();
        Self {
            container,
            tab_bar,
            list,
            add,
            updates,
        }
    }

    /// The container behind the session
    #[must_use]
    pub const fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// The tab bar
    #[must_use]
    pub const fn tab_bar(&self) -> &TabBar {
        &self.tab_bar
    }

    /// The list screen
    #[must_use]
    pub const fn list(&self) -> &ListScreen {
        &self.list
    }

    /// Open a detail screen for `id`
    #[must_use]
    pub fn detail(&self, id: TodoId) -> DetailScreen {
        DetailScreen::new(self.container.create_detail_view_model(id))
    }

    /// Wait `settle`, then let the list screen pick up UI updates
    pub async fn settle(&mut self, settle: Duration) -> usize {
        tokio::time::sleep(settle).await;
        self.list.apply_updates(&mut self.updates)
    }

    /// Walk through list, add and detail screens, returning a transcript.
    ///
    /// `settle` should exceed the reactive debounce so UI updates have
    /// arrived before they are checked.
    pub async fn run_script(&mut self, settle: Duration) -> Vec<String> {
        let mut transcript = Vec::new();
        let stage = self.container.stage();
        tracing::info!(stage = %stage, "Scripted session started");

        self.list.appear();
        transcript.push(format!("== {} ==", stage.full_description()));
        transcript.push(format!("List on launch:\n{}", self.list.render()));

        self.list.disappear();
        for title in ["Buy milk", "   ", "Walk the dog"] {
            match self.add.submit(title) {
                Ok(todo) => transcript.push(format!("Added '{}' as {}", todo.title, todo.id)),
                Err(err) => transcript.push(format!("Rejected '{title}': {err}")),
            }
        }
        let received = self.settle(settle).await;
        transcript.push(format!(
            "Tab bar while away: {} ({received} UI updates)",
            self.tab_bar.label()
        ));

        self.list.appear();
        transcript.push(format!(
            "List after returning ({} reloads), tab bar: {}\n{}",
            self.list.reloads(),
            self.tab_bar.label(),
            self.list.render()
        ));

        if let Some(id) = self.list.rows().len().checked_sub(1).and_then(|last| self.list.select(last)) {
            self.list.disappear();
            let detail = self.detail(id);
            detail.toggle();
            if let Err(err) = detail.rename("Walk the dog twice") {
                transcript.push(format!("Rename rejected: {err}"));
            }
            transcript.push(format!("Detail: {}", detail.render()));
            detail.delete();
            transcript.push(format!("Detail after delete: {}", detail.render()));
        }

        let received = self.settle(settle).await;
        self.list.appear();
        transcript.push(format!(
            "List at the end ({received} UI updates while away), tab bar: {}\n{}",
            self.tab_bar.label(),
            self.list.render()
        ));

        tracing::info!(stage = %stage, reloads = self.list.reloads(), "Scripted session finished");
        transcript
    }

    /// Drop the screens' bindings and dispose the service
    pub fn shutdown(self) {
        let Self { container, list, .. } = self;
        drop(list);
        container.shutdown();
    }
}
