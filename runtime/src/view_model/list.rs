//! List screen view models.
//!
//! [`CallbackTodoListViewModel`] serves stages 1 to 6 and drives the badge
//! through `subscribe_badge`. [`ReactiveTodoListViewModel`] serves the
//! reactive stage and mirrors the service's badge subject into its own.

use crate::stages::ReactiveDataService;
use crate::subject::{StateSubject, Subscription};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use todo_sync_core::{BadgeCallback, ObserverId, Todo, TodoChange, TodoDataService, TodoId};

/// What a list screen needs from its view model.
///
/// Index-based operations return `None` for out-of-range indexes.
pub trait TodoListViewModel: Send + Sync {
    /// The service behind this view model
    fn data_service(&self) -> &dyn TodoDataService;

    /// Current badge value
    fn badge_count(&self) -> usize;

    /// Install the badge handler; it is called with the current value
    /// immediately and on every change. Replaces any previous handler.
    fn set_badge_update_handler(&self, handler: BadgeCallback);

    /// Reset the badge if it is above zero
    fn mark_badge_as_viewed(&self);

    /// Snapshot of the todos
    fn todos(&self) -> Vec<Todo> {
        self.data_service().list()
    }

    /// Add a todo
    fn add_todo(&self, title: &str) -> Todo {
        self.data_service().add(title)
    }

    /// Todo at `index`
    fn todo_at(&self, index: usize) -> Option<Todo> {
        self.todos().into_iter().nth(index)
    }

    /// Todo with `id`
    fn todo_by_id(&self, id: &TodoId) -> Option<Todo> {
        self.data_service().get(id)
    }

    /// Delete the todo at `index`
    fn delete_at(&self, index: usize) -> Option<Todo> {
        let todo = self.todo_at(index)?;
        self.data_service().delete_by_id(&todo.id)
    }

    /// Delete the todo with `id`
    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        self.data_service().delete_by_id(id)
    }

    /// Flip the completion flag of the todo at `index`, returning the result
    fn toggle_completion_at(&self, index: usize) -> Option<Todo> {
        let toggled = self.todo_at(index)?.toggled();
        self.data_service()
            .update(toggled.clone())
            .then_some(toggled)
    }
}

type HandlerSlot = Arc<Mutex<Option<BadgeCallback>>>;

fn bind_logging_consumer(service: &dyn TodoDataService) -> ObserverId {
    let stage = service.stage();
    service.bind_consumer(Arc::new(move |change: &TodoChange| {
        tracing::debug!(
            stage = %stage,
            operation = %change.operation,
            total = change.total,
            "List view model notified"
        );
    }))
}

/// List view model for the non-reactive stages
pub struct CallbackTodoListViewModel {
    service: Arc<dyn TodoDataService>,
    binding: ObserverId,
    badge_subscription: Option<ObserverId>,
    badge: Arc<AtomicUsize>,
    handler: HandlerSlot,
}

impl CallbackTodoListViewModel {
    /// Bind to `service`
    #[must_use]
    pub fn new(service: Arc<dyn TodoDataService>) -> Self {
        let stage = service.stage();
        let binding = bind_logging_consumer(service.as_ref());

        let badge = Arc::new(AtomicUsize::new(0));
        let handler: HandlerSlot = Arc::new(Mutex::new(None));
        let badge_subscription = if stage.badge_supported() {
            let cached = Arc::clone(&badge);
            let slot = Arc::clone(&handler);
            service.subscribe_badge(Arc::new(move |count: usize| {
                cached.store(count, Ordering::SeqCst);
                let current = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
                if let Some(handler) = current {
                    handler(count);
                }
            }))
        } else {
            None
        };

        tracing::debug!(stage = %stage, binding = %binding, badge = badge_subscription.is_some(), "List view model bound");
        Self {
            service,
            binding,
            badge_subscription,
            badge,
            handler,
        }
    }
}

impl TodoListViewModel for CallbackTodoListViewModel {
    fn data_service(&self) -> &dyn TodoDataService {
        self.service.as_ref()
    }

    fn badge_count(&self) -> usize {
        self.badge.load(Ordering::SeqCst)
    }

    fn set_badge_update_handler(&self, handler: BadgeCallback) {
        handler(self.badge_count());
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn mark_badge_as_viewed(&self) {
        if self.badge_count() > 0 {
            self.service.clear_badge();
        }
    }
}

impl Drop for CallbackTodoListViewModel {
    fn drop(&mut self) {
        self.service.unbind_consumer(self.binding);
        if let Some(id) = self.badge_subscription {
            self.service.unsubscribe_badge(id);
        }
    }
}

/// List view model for the reactive stage
pub struct ReactiveTodoListViewModel {
    service: Arc<ReactiveDataService>,
    binding: ObserverId,
    badge: StateSubject<usize>,
    _mirror: Subscription,
    handler: Mutex<Option<Subscription>>,
}

impl ReactiveTodoListViewModel {
    /// Bind to `service` and mirror its badge
    #[must_use]
    pub fn new(service: Arc<ReactiveDataService>) -> Self {
        let binding = bind_logging_consumer(service.as_ref());
        let badge = StateSubject::new(service.badge().value());
        let target = badge.clone();
        let mirror = service.badge().subscribe(move |count: &usize| target.send(*count));
        tracing::debug!(stage = %service.stage(), binding = %binding, "Reactive list view model bound");
        Self {
            service,
            binding,
            badge,
            _mirror: mirror,
            handler: Mutex::new(None),
        }
    }

    /// This view model's badge subject
    #[must_use]
    pub const fn badge(&self) -> &StateSubject<usize> {
        &self.badge
    }

    /// The reactive service behind this view model
    #[must_use]
    pub const fn reactive_service(&self) -> &Arc<ReactiveDataService> {
        &self.service
    }
}

impl TodoListViewModel for ReactiveTodoListViewModel {
    fn data_service(&self) -> &dyn TodoDataService {
        self.service.as_ref()
    }

    fn badge_count(&self) -> usize {
        self.badge.value()
    }

    fn set_badge_update_handler(&self, handler: BadgeCallback) {
        let subscription = self.badge.subscribe(move |count: &usize| handler(*count));
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);
    }

    fn mark_badge_as_viewed(&self) {
        if self.badge_count() > 0 {
            self.service.clear_badge();
        }
    }
}

impl Drop for ReactiveTodoListViewModel {
    fn drop(&mut self) {
        self.service.unbind_consumer(self.binding);
    }
}
