//! Stage 4: changes go out on the [`EventBus`].
//!
//! Every mutation is published as a [`TodoEvent`] tagged with the stage. The
//! service subscribes to its own events and turns each one into a
//! [`UiUpdate`], which async listeners pick up on their own task. Bound
//! consumers are topic handlers filtered to this stage.
//!
//! [`BroadcastHub`] holds that plumbing plus the badge, and is reused by the
//! shared and persisted stages.

use super::ListCore;
use crate::badge::BadgeCounter;
use crate::event_bus::EventBus;
use crate::list::TodoList;
use crate::metrics::{record_badge_cleared, record_ui_update};
use crate::registry::Registry;
use crate::subject::Subscription;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use todo_sync_core::{
    BadgeCallback, ChangeObserver, Clock, ObserverId, ServiceEnvironment, SyncStage, Todo,
    TodoChange, TodoDataService, TodoEvent, TodoId, UiUpdate,
};

/// Bus publishing, UI relay, consumer bindings and badge for one stage
pub(crate) struct BroadcastHub {
    stage: SyncStage,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    badge: Arc<BadgeCounter>,
    relay: Mutex<Option<Subscription>>,
    consumers: Registry<Subscription>,
}

impl BroadcastHub {
    pub(crate) fn new(
        stage: SyncStage,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        badge_initial: usize,
    ) -> Self {
        let badge = Arc::new(BadgeCounter::new(badge_initial));
        let relay = Self::relay(stage, &bus, Arc::clone(&clock), Arc::clone(&badge));
        Self {
            stage,
            bus,
            clock,
            badge,
            relay: Mutex::new(Some(relay)),
            consumers: Registry::new(),
        }
    }

    fn relay(
        stage: SyncStage,
        bus: &Arc<EventBus>,
        clock: Arc<dyn Clock>,
        badge: Arc<BadgeCounter>,
    ) -> Subscription {
        // Weak: the handler lives inside the bus it publishes to
        let target: Weak<EventBus> = Arc::downgrade(bus);
        bus.todo_events().subscribe(move |event: &TodoEvent| {
            if event.stage != stage {
                return;
            }
            let Some(bus) = target.upgrade() else {
                return;
            };
            let update = UiUpdate {
                stage,
                operation: event.change.operation,
                count: event.change.total,
                badge_count: badge.count(),
                timestamp: clock.now(),
            };
            let delivered = bus.ui_updates().publish(update);
            record_ui_update(stage);
            tracing::debug!(
                stage = %stage,
                operation = %event.change.operation,
                listeners = delivered,
                "Requested UI update"
            );
        })
    }

    pub(crate) fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub(crate) fn badge(&self) -> &BadgeCounter {
        &self.badge
    }

    pub(crate) fn publish(&self, change: TodoChange) {
        let operation = change.operation;
        let event = TodoEvent {
            stage: self.stage,
            change,
            occurred_at: self.clock.now(),
        };
        self.bus.todo_events().publish(event);
        tracing::debug!(stage = %self.stage, operation = %operation, "Published todo event");
    }

    pub(crate) fn bind(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        let stage = self.stage;
        let subscription = self.bus.todo_events().subscribe(move |event: &TodoEvent| {
            if event.stage == stage {
                observer.todos_changed(&event.change);
            }
        });
        let id = self.consumers.insert(subscription);
        tracing::debug!(stage = %stage, observer = %id, "Consumer subscribed to todo events");
        id
    }

    pub(crate) fn unbind(&self, id: ObserverId) {
        if self.consumers.remove(id).is_some() {
            tracing::debug!(stage = %self.stage, observer = %id, "Consumer unsubscribed from todo events");
        }
    }

    pub(crate) fn subscribe_badge(&self, callback: BadgeCallback) -> ObserverId {
        let id = self.badge.subscribe(callback);
        tracing::debug!(stage = %self.stage, observer = %id, "Badge subscriber added");
        id
    }

    pub(crate) fn unsubscribe_badge(&self, id: ObserverId) {
        if self.badge.unsubscribe(id) {
            tracing::debug!(stage = %self.stage, observer = %id, "Badge subscriber removed");
        }
    }

    pub(crate) fn clear_badge(&self) -> usize {
        let previous = self.badge.clear();
        record_badge_cleared(self.stage);
        tracing::debug!(stage = %self.stage, previous, "Badge cleared");
        previous
    }

    pub(crate) fn dispose(&self) {
        let relay = self.relay.lock().unwrap_or_else(PoisonError::into_inner).take();
        drop(relay);
        let consumers = self.consumers.clear();
        let badge = self.badge.unsubscribe_all();
        tracing::debug!(stage = %self.stage, consumers, badge, "Broadcast bindings released");
    }
}

/// Data service publishing every change on the bus
pub struct BroadcastDataService {
    core: ListCore,
    hub: BroadcastHub,
}

impl BroadcastDataService {
    /// Create the service with the stage's default todos
    #[must_use]
    pub fn new(env: ServiceEnvironment, bus: Arc<EventBus>) -> Self {
        let hub = BroadcastHub::new(SyncStage::Stage4, bus, Arc::clone(&env.clock), 0);
        let service = Self {
            core: ListCore::seeded(SyncStage::Stage4, env),
            hub,
        };
        tracing::info!(stage = %SyncStage::Stage4, count = service.core.len(), "Broadcast data service ready");
        service
    }

    /// Create the service with explicit starting todos
    #[must_use]
    pub fn with_todos(env: ServiceEnvironment, bus: Arc<EventBus>, todos: Vec<Todo>) -> Self {
        let hub = BroadcastHub::new(SyncStage::Stage4, bus, Arc::clone(&env.clock), 0);
        Self {
            core: ListCore::new(SyncStage::Stage4, env, TodoList::new(todos)),
            hub,
        }
    }

    /// The bus this service publishes to
    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        self.hub.bus()
    }
}

impl TodoDataService for BroadcastDataService {
    fn stage(&self) -> SyncStage {
        self.core.stage()
    }

    fn list(&self) -> Vec<Todo> {
        self.core.snapshot()
    }

    fn add(&self, title: &str) -> Todo {
        let change = self.core.add(title);
        self.hub.badge().increment();
        let todo = change.todo.clone();
        self.hub.publish(change);
        todo
    }

    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        let change = self.core.delete(id)?;
        let todo = change.todo.clone();
        self.hub.publish(change);
        Some(todo)
    }

    fn update(&self, todo: Todo) -> bool {
        let Some(change) = self.core.update(todo) else {
            return false;
        };
        self.hub.publish(change);
        true
    }

    fn bind_consumer(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        self.hub.bind(observer)
    }

    fn unbind_consumer(&self, id: ObserverId) {
        self.hub.unbind(id);
    }

    fn dispose(&self) {
        self.hub.dispose();
    }

    fn subscribe_badge(&self, callback: BadgeCallback) -> Option<ObserverId> {
        Some(self.hub.subscribe_badge(callback))
    }

    fn unsubscribe_badge(&self, id: ObserverId) {
        self.hub.unsubscribe_badge(id);
    }

    fn clear_badge(&self) {
        self.hub.clear_badge();
    }

    fn badge_count(&self) -> usize {
        self.hub.badge().count()
    }
}
