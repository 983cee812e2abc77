//! Stage 7: state lives in subjects, propagation is a set of pipelines.
//!
//! ```text
//! todos ─────────────────────────────▶ statistics
//! operations ─┬─ filter(add) ────────▶ badge
//!             └─ map(UiUpdate) ──────▶ ui ── debounce ──▶ bus.ui_updates
//! ```
//!
//! Mutations update the `todos` subject first and then emit on
//! `operations`, so every downstream value sees the post-mutation list.
//! The badge pipeline is registered before the UI pipeline, so a UI update
//! for an addition already carries the incremented badge.
//!
//! All pipeline subscriptions are owned by the service and released by
//! [`dispose`](TodoDataService::dispose).

use crate::event_bus::EventBus;
use crate::list::{TodoList, default_titles};
use crate::metrics::{record_badge_cleared, record_mutation, record_ui_update};
use crate::registry::Registry;
use crate::subject::{EventSubject, StateSubject, Subscription, debounce};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use todo_sync_core::{
    BadgeCallback, ChangeObserver, ObserverId, Operation, ServiceEnvironment, SyncStage, Todo,
    TodoChange, TodoDataService, TodoEvent, TodoId, UiUpdate,
};

/// Default quiet period before a UI update is forwarded to the bus
pub const DEFAULT_UI_DEBOUNCE: Duration = Duration::from_millis(50);

/// Running figures kept in the statistics subject
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReactiveStatistics {
    /// Operations emitted
    pub total_operations: u64,
    /// Calls to `list`
    pub reads: u64,
    /// Values emitted by the todos subject, including the initial one
    pub list_emissions: u64,
    /// UI updates forwarded to the bus after debouncing
    pub ui_updates: u64,
    /// When the service was created
    pub created_at: DateTime<Utc>,
}

impl ReactiveStatistics {
    fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            total_operations: 0,
            reads: 0,
            list_emissions: 0,
            ui_updates: 0,
            created_at,
        }
    }
}

/// Data service built on reactive subjects
pub struct ReactiveDataService {
    stage: SyncStage,
    env: ServiceEnvironment,
    todos: StateSubject<TodoList>,
    operations: EventSubject<TodoEvent>,
    ui_updates: EventSubject<UiUpdate>,
    badge: StateSubject<usize>,
    statistics: StateSubject<ReactiveStatistics>,
    pipelines: Mutex<Vec<Subscription>>,
    consumers: Registry<Subscription>,
    badge_subscribers: Registry<Subscription>,
}

impl ReactiveDataService {
    /// Create the service with the stage's default todos.
    ///
    /// Must be called inside a tokio runtime for debouncing to take effect.
    #[must_use]
    pub fn new(env: ServiceEnvironment, bus: Arc<EventBus>, ui_debounce: Duration) -> Self {
        let list = TodoList::seeded(env.ids.as_ref(), default_titles(SyncStage::Stage7));
        let service = Self::with_list(env, bus, ui_debounce, list);
        tracing::info!(
            stage = %SyncStage::Stage7,
            count = service.todos.value().len(),
            debounce_ms = u64::try_from(ui_debounce.as_millis()).unwrap_or(u64::MAX),
            "Reactive data service ready"
        );
        service
    }

    /// Create the service with explicit starting todos
    #[must_use]
    pub fn with_todos(
        env: ServiceEnvironment,
        bus: Arc<EventBus>,
        ui_debounce: Duration,
        todos: Vec<Todo>,
    ) -> Self {
        Self::with_list(env, bus, ui_debounce, TodoList::new(todos))
    }

    fn with_list(
        env: ServiceEnvironment,
        bus: Arc<EventBus>,
        ui_debounce: Duration,
        list: TodoList,
    ) -> Self {
        let service = Self {
            stage: SyncStage::Stage7,
            todos: StateSubject::new(list),
            operations: EventSubject::new(),
            ui_updates: EventSubject::new(),
            badge: StateSubject::new(0),
            statistics: StateSubject::new(ReactiveStatistics::new(env.clock.now())),
            env,
            pipelines: Mutex::new(Vec::new()),
            consumers: Registry::new(),
            badge_subscribers: Registry::new(),
        };
        let pipelines = service.build_pipelines(bus, ui_debounce);
        *service.pipelines.lock().unwrap_or_else(PoisonError::into_inner) = pipelines;
        service
    }

    fn build_pipelines(&self, bus: Arc<EventBus>, ui_debounce: Duration) -> Vec<Subscription> {
        let mut pipelines = Vec::with_capacity(5);

        let badge = self.badge.clone();
        pipelines.push(self.operations.subscribe(move |event: &TodoEvent| {
            if event.change.operation == Operation::Add {
                badge.update(|count| *count += 1);
            }
        }));

        let badge = self.badge.clone();
        let ui = self.ui_updates.clone();
        let statistics = self.statistics.clone();
        let clock = Arc::clone(&self.env.clock);
        pipelines.push(self.operations.subscribe(move |event: &TodoEvent| {
            statistics.update(|stats| stats.total_operations += 1);
            ui.send(UiUpdate {
                stage: event.stage,
                operation: event.change.operation,
                count: event.change.total,
                badge_count: badge.value(),
                timestamp: clock.now(),
            });
        }));

        let statistics = self.statistics.clone();
        let stage = self.stage;
        pipelines.push(debounce(&self.ui_updates, ui_debounce, move |update: UiUpdate| {
            statistics.update(|stats| stats.ui_updates += 1);
            let operation = update.operation;
            let delivered = bus.ui_updates().publish(update);
            record_ui_update(stage);
            tracing::debug!(stage = %stage, operation = %operation, listeners = delivered, "Requested UI update");
        }));

        let statistics = self.statistics.clone();
        pipelines.push(self.todos.subscribe(move |list: &TodoList| {
            statistics.update(|stats| stats.list_emissions += 1);
            tracing::trace!(stage = %stage, count = list.len(), "Todos emitted");
        }));

        pipelines.push(self.badge.subscribe(move |count: &usize| {
            if *count == 0 {
                tracing::debug!(stage = %stage, "Badge reset");
            }
        }));

        pipelines
    }

    /// The todo list subject
    #[must_use]
    pub const fn todos(&self) -> &StateSubject<TodoList> {
        &self.todos
    }

    /// Every applied operation
    #[must_use]
    pub const fn operations(&self) -> &EventSubject<TodoEvent> {
        &self.operations
    }

    /// The badge subject
    #[must_use]
    pub const fn badge(&self) -> &StateSubject<usize> {
        &self.badge
    }

    /// Current statistics
    #[must_use]
    pub fn statistics(&self) -> ReactiveStatistics {
        self.statistics.value()
    }

    /// Number of live pipelines; zero after dispose
    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn emit(&self, change: TodoChange) {
        record_mutation(self.stage, change.operation);
        tracing::debug!(
            stage = %self.stage,
            operation = %change.operation,
            id = %change.todo.id,
            total = change.total,
            "Emitting operation"
        );
        self.operations.send(TodoEvent {
            stage: self.stage,
            change,
            occurred_at: self.env.clock.now(),
        });
    }
}

impl TodoDataService for ReactiveDataService {
    fn stage(&self) -> SyncStage {
        self.stage
    }

    fn list(&self) -> Vec<Todo> {
        self.statistics.update(|stats| stats.reads += 1);
        self.todos.value().into_vec()
    }

    fn add(&self, title: &str) -> Todo {
        let todo = Todo::new(self.env.ids.next_id(), title);
        let change = self.todos.update(|list| list.push(todo));
        let added = change.todo.clone();
        self.emit(change);
        added
    }

    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        if self.todos.value().get(id).is_none() {
            tracing::warn!(stage = %self.stage, id = %id, "Todo to delete not found");
            return None;
        }
        let change = self.todos.update(|list| list.remove(id))?;
        let removed = change.todo.clone();
        self.emit(change);
        Some(removed)
    }

    fn update(&self, todo: Todo) -> bool {
        if self.todos.value().get(&todo.id).is_none() {
            tracing::warn!(stage = %self.stage, id = %todo.id, "Todo to update not found");
            return false;
        }
        let Some(change) = self.todos.update(|list| list.replace(todo)) else {
            return false;
        };
        self.emit(change);
        true
    }

    fn bind_consumer(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        let subscription = self
            .operations
            .subscribe(move |event: &TodoEvent| observer.todos_changed(&event.change));
        let id = self.consumers.insert(subscription);
        tracing::debug!(stage = %self.stage, observer = %id, "Consumer subscribed to operations");
        id
    }

    fn unbind_consumer(&self, id: ObserverId) {
        if self.consumers.remove(id).is_some() {
            tracing::debug!(stage = %self.stage, observer = %id, "Consumer unsubscribed from operations");
        }
    }

    fn dispose(&self) {
        let pipelines = std::mem::take(&mut *self.pipelines.lock().unwrap_or_else(PoisonError::into_inner));
        let released = pipelines.len();
        drop(pipelines);
        let consumers = self.consumers.clear();
        let badge = self.badge_subscribers.clear();
        tracing::info!(stage = %self.stage, pipelines = released, consumers, badge, "Reactive subscriptions released");
    }

    fn subscribe_badge(&self, callback: BadgeCallback) -> Option<ObserverId> {
        let subscription = self.badge.subscribe(move |count: &usize| callback(*count));
        Some(self.badge_subscribers.insert(subscription))
    }

    fn unsubscribe_badge(&self, id: ObserverId) {
        self.badge_subscribers.remove(id);
    }

    fn clear_badge(&self) {
        self.badge.send(0);
        record_badge_cleared(self.stage);
    }

    fn badge_count(&self) -> usize {
        self.badge.value()
    }
}
