//! Stage 5: one explicitly shared instance.
//!
//! Propagation works exactly like the broadcast stage. On top of that the
//! service tracks how often it is read and written, so screens can show that
//! every one of them talks to the same instance.

use super::ListCore;
use super::broadcast::BroadcastHub;
use crate::event_bus::EventBus;
use crate::list::TodoList;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use todo_sync_core::{
    BadgeCallback, ChangeObserver, ObserverId, ServiceEnvironment, SyncStage, Todo,
    TodoDataService, TodoId,
};
use uuid::Uuid;

/// Usage figures for a [`SharedDataService`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SharedStatistics {
    /// Identifies the instance; equal across every holder of the same service
    pub instance_id: Uuid,
    /// When the instance was created
    pub created_at: DateTime<Utc>,
    /// Number of list reads
    pub access_count: u64,
    /// Number of applied mutations
    pub change_count: u64,
    /// Current number of todos
    pub todo_count: usize,
}

/// Data service shared by every screen, with usage statistics
pub struct SharedDataService {
    core: ListCore,
    hub: BroadcastHub,
    instance_id: Uuid,
    created_at: DateTime<Utc>,
    access_count: AtomicU64,
    change_count: AtomicU64,
}

impl SharedDataService {
    /// Create the service with the stage's default todos
    #[must_use]
    pub fn new(env: ServiceEnvironment, bus: Arc<EventBus>) -> Self {
        let service = Self::from_core(ListCore::seeded(SyncStage::Stage5, env), bus);
        tracing::info!(
            stage = %SyncStage::Stage5,
            instance = %service.instance_id,
            count = service.core.len(),
            "Shared data service ready"
        );
        service
    }

    /// Create the service with explicit starting todos
    #[must_use]
    pub fn with_todos(env: ServiceEnvironment, bus: Arc<EventBus>, todos: Vec<Todo>) -> Self {
        Self::from_core(
            ListCore::new(SyncStage::Stage5, env, TodoList::new(todos)),
            bus,
        )
    }

    fn from_core(core: ListCore, bus: Arc<EventBus>) -> Self {
        let clock = Arc::clone(&core.env().clock);
        let created_at = clock.now();
        Self {
            hub: BroadcastHub::new(SyncStage::Stage5, bus, clock, 0),
            core,
            instance_id: Uuid::new_v4(),
            created_at,
            access_count: AtomicU64::new(0),
            change_count: AtomicU64::new(0),
        }
    }

    /// Identifier of this instance
    #[must_use]
    pub const fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Current usage figures
    #[must_use]
    pub fn statistics(&self) -> SharedStatistics {
        SharedStatistics {
            instance_id: self.instance_id,
            created_at: self.created_at,
            access_count: self.access_count.load(Ordering::Relaxed),
            change_count: self.change_count.load(Ordering::Relaxed),
            todo_count: self.core.len(),
        }
    }

    fn record_change(&self) {
        let total = self.change_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(instance = %self.instance_id, total, "Change recorded");
    }
}

impl TodoDataService for SharedDataService {
    fn stage(&self) -> SyncStage {
        self.core.stage()
    }

    fn list(&self) -> Vec<Todo> {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        self.core.snapshot()
    }

    fn add(&self, title: &str) -> Todo {
        let change = self.core.add(title);
        self.record_change();
        self.hub.badge().increment();
        let todo = change.todo.clone();
        self.hub.publish(change);
        todo
    }

    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        let change = self.core.delete(id)?;
        self.record_change();
        let todo = change.todo.clone();
        self.hub.publish(change);
        Some(todo)
    }

    fn update(&self, todo: Todo) -> bool {
        let Some(change) = self.core.update(todo) else {
            return false;
        };
        self.record_change();
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
        tracing::debug!(instance = %self.instance_id, "Shared data service disposed");
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
