//! Stage 6: broadcast propagation plus a write-through cache.
//!
//! The in-memory list is authoritative for the running session. Every
//! mutation writes the whole list to the [`KeyValueStore`] as JSON; the badge
//! and the usage counters live under their own keys. On load, missing or
//! undecodable data is replaced by the default todos.
//!
//! Storage failures never reach the caller. Read failures fall back to
//! defaults with a warning; write failures are logged at error level and the
//! cache keeps serving.

use super::ListCore;
use super::broadcast::BroadcastHub;
use crate::event_bus::EventBus;
use crate::list::{TodoList, default_titles};
use crate::metrics::record_storage_write_error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use todo_sync_core::{
    BadgeCallback, ChangeObserver, KeyValueStore, ObserverId, ServiceEnvironment, StorageError,
    SyncStage, Todo, TodoDataService, TodoId,
};

/// Key holding the JSON array of todos
pub const TODOS_KEY: &str = "todo_sync.todos";
/// Key holding the number of list reads
pub const ACCESS_COUNT_KEY: &str = "todo_sync.access_count";
/// Key holding the number of applied mutations
pub const CHANGE_COUNT_KEY: &str = "todo_sync.change_count";
/// Key holding the RFC 3339 time of the first launch
pub const FIRST_LAUNCH_KEY: &str = "todo_sync.first_launch";
/// Key holding the badge value
pub const BADGE_COUNT_KEY: &str = "todo_sync.badge_count";

const ALL_KEYS: [&str; 5] = [
    TODOS_KEY,
    ACCESS_COUNT_KEY,
    CHANGE_COUNT_KEY,
    FIRST_LAUNCH_KEY,
    BADGE_COUNT_KEY,
];

/// Snapshot of what the persisted stage has stored
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersistenceStatistics {
    /// Todos currently cached
    pub todo_count: usize,
    /// Stored number of list reads
    pub access_count: u64,
    /// Stored number of applied mutations
    pub change_count: u64,
    /// Stored first-launch time, if readable
    pub first_launch: Option<DateTime<Utc>>,
    /// Current badge value
    pub badge_count: usize,
    /// Size of the stored todo array in bytes
    pub storage_bytes: usize,
    /// Whether the cache has been filled from storage
    pub cache_loaded: bool,
}

/// Data service with a write-through persisted cache
pub struct PersistedDataService {
    core: ListCore,
    hub: BroadcastHub,
    store: Arc<dyn KeyValueStore>,
    cache_loaded: AtomicBool,
}

impl PersistedDataService {
    /// Open the service on `store`, loading or seeding the todos
    #[must_use]
    pub fn open(env: ServiceEnvironment, bus: Arc<EventBus>, store: Arc<dyn KeyValueStore>) -> Self {
        let badge = usize::try_from(read_counter(store.as_ref(), BADGE_COUNT_KEY)).unwrap_or(0);
        let hub = BroadcastHub::new(SyncStage::Stage6, bus, Arc::clone(&env.clock), badge);
        let service = Self {
            core: ListCore::new(SyncStage::Stage6, env, TodoList::default()),
            hub,
            store,
            cache_loaded: AtomicBool::new(false),
        };
        service.ensure_loaded();
        tracing::info!(
            stage = %SyncStage::Stage6,
            count = service.core.len(),
            badge,
            "Persisted data service ready"
        );
        service
    }

    fn ensure_loaded(&self) {
        if self.cache_loaded.swap(true, Ordering::SeqCst) {
            return;
        }
        self.record_first_launch();
        let list = self.load_todos();
        self.core.replace_all(list);
    }

    fn load_todos(&self) -> TodoList {
        let raw = match self.store.get(TODOS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(stage = %self.stage(), "No stored todos, seeding defaults");
                return self.reseed();
            }
            Err(err) => {
                tracing::warn!(stage = %self.stage(), error = %err, "Reading stored todos failed, seeding defaults");
                return self.reseed();
            }
        };

        match decode_todos(&raw) {
            Ok(todos) => {
                tracing::info!(stage = %self.stage(), count = todos.len(), "Loaded stored todos");
                TodoList::new(todos)
            }
            Err(err) => {
                tracing::warn!(stage = %self.stage(), error = %err, "Stored todos unreadable, seeding defaults");
                self.reseed()
            }
        }
    }

    fn reseed(&self) -> TodoList {
        let list = TodoList::seeded(
            self.core.env().ids.as_ref(),
            default_titles(SyncStage::Stage6),
        );
        self.write_todos(list.items());
        list
    }

    fn write_todos(&self, todos: &[Todo]) {
        match serde_json::to_string(todos) {
            Ok(json) => self.write(TODOS_KEY, &json),
            Err(err) => {
                let err = StorageError::Encode {
                    key: TODOS_KEY.to_string(),
                    reason: err.to_string(),
                };
                record_storage_write_error(self.stage());
                tracing::error!(stage = %self.stage(), error = %err, "Saving todos failed");
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            record_storage_write_error(self.stage());
            tracing::error!(stage = %self.stage(), key, error = %err, "Storage write failed");
        }
    }

    fn bump(&self, key: &str) -> u64 {
        let next = read_counter(self.store.as_ref(), key).saturating_add(1);
        self.write(key, &next.to_string());
        next
    }

    fn record_first_launch(&self) {
        if matches!(self.store.get(FIRST_LAUNCH_KEY), Ok(Some(_))) {
            return;
        }
        let now = self.core.env().clock.now().to_rfc3339();
        self.write(FIRST_LAUNCH_KEY, &now);
        tracing::info!(stage = %self.stage(), first_launch = %now, "Recorded first launch");
    }

    fn persist_change(&self) {
        self.write_todos(&self.core.snapshot());
        let changes = self.bump(CHANGE_COUNT_KEY);
        tracing::debug!(stage = %self.stage(), changes, "Saved todos");
    }

    fn persist_badge(&self) {
        self.write(BADGE_COUNT_KEY, &self.hub.badge().count().to_string());
    }

    /// Remove every stored key and empty the cache.
    ///
    /// The next access reloads from the now empty store and so reseeds the
    /// defaults.
    pub fn clear_all_persistent_data(&self) {
        for key in ALL_KEYS {
            if let Err(err) = self.store.remove(key) {
                tracing::error!(stage = %self.stage(), key, error = %err, "Removing stored key failed");
            }
        }
        self.core.replace_all(TodoList::default());
        self.hub.badge().clear();
        self.cache_loaded.store(false, Ordering::SeqCst);
        tracing::info!(stage = %self.stage(), "Cleared all persistent data");
    }

    /// What is currently stored
    #[must_use]
    pub fn statistics(&self) -> PersistenceStatistics {
        let store = self.store.as_ref();
        PersistenceStatistics {
            todo_count: self.core.len(),
            access_count: read_counter(store, ACCESS_COUNT_KEY),
            change_count: read_counter(store, CHANGE_COUNT_KEY),
            first_launch: store
                .get(FIRST_LAUNCH_KEY)
                .ok()
                .flatten()
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|time| time.with_timezone(&Utc)),
            badge_count: self.hub.badge().count(),
            storage_bytes: store.size_of(TODOS_KEY).unwrap_or(0),
            cache_loaded: self.cache_loaded.load(Ordering::SeqCst),
        }
    }

    /// Statistics, cached todos and raw stored values as one JSON document
    #[must_use]
    pub fn export_debug(&self) -> serde_json::Value {
        let stored: serde_json::Map<String, serde_json::Value> = ALL_KEYS
            .iter()
            .map(|key| {
                let value = self
                    .store
                    .get(key)
                    .ok()
                    .flatten()
                    .map_or(serde_json::Value::Null, serde_json::Value::String);
                ((*key).to_string(), value)
            })
            .collect();

        serde_json::json!({
            "stage": self.stage().display_name(),
            "statistics": self.statistics(),
            "todos": self.core.snapshot(),
            "stored": stored,
        })
    }
}

fn decode_todos(raw: &str) -> Result<Vec<Todo>, StorageError> {
    let decode_error = |reason: String| StorageError::Decode {
        key: TODOS_KEY.to_string(),
        reason,
    };
    let todos: Vec<Todo> = serde_json::from_str(raw).map_err(|err| decode_error(err.to_string()))?;
    let mut seen = HashSet::with_capacity(todos.len());
    if let Some(duplicate) = todos.iter().find(|todo| !seen.insert(&todo.id)) {
        return Err(decode_error(format!("duplicate id {}", duplicate.id)));
    }
    Ok(todos)
}

fn read_counter(store: &dyn KeyValueStore, key: &str) -> u64 {
    match store.get(key) {
        Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|err| {
            tracing::warn!(key, value = %raw, error = %err, "Stored counter unreadable, using 0");
            0
        }),
        Ok(None) => 0,
        Err(err) => {
            tracing::warn!(key, error = %err, "Reading stored counter failed, using 0");
            0
        }
    }
}

impl TodoDataService for PersistedDataService {
    fn stage(&self) -> SyncStage {
        self.core.stage()
    }

    fn list(&self) -> Vec<Todo> {
        self.ensure_loaded();
        self.bump(ACCESS_COUNT_KEY);
        self.core.snapshot()
    }

    fn add(&self, title: &str) -> Todo {
        self.ensure_loaded();
        let change = self.core.add(title);
        self.persist_change();
        self.hub.badge().increment();
        self.persist_badge();
        let todo = change.todo.clone();
        self.hub.publish(change);
        todo
    }

    fn delete_by_id(&self, id: &TodoId) -> Option<Todo> {
        self.ensure_loaded();
        let change = self.core.delete(id)?;
        self.persist_change();
        let todo = change.todo.clone();
        self.hub.publish(change);
        Some(todo)
    }

    fn update(&self, todo: Todo) -> bool {
        self.ensure_loaded();
        let Some(change) = self.core.update(todo) else {
            return false;
        };
        self.persist_change();
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
        if let Err(err) = self.store.flush() {
            tracing::error!(stage = %self.stage(), error = %err, "Flushing storage failed");
        }
    }

    fn subscribe_badge(&self, callback: BadgeCallback) -> Option<ObserverId> {
        Some(self.hub.subscribe_badge(callback))
    }

    fn unsubscribe_badge(&self, id: ObserverId) {
        self.hub.unsubscribe_badge(id);
    }

    fn clear_badge(&self) {
        self.hub.clear_badge();
        self.persist_badge();
    }

    fn badge_count(&self) -> usize {
        self.hub.badge().count()
    }
}
