//! Shared fixtures for the runtime integration tests

#![allow(dead_code)] // Not every test file uses every fixture

use std::sync::Arc;
use std::time::Duration;
use todo_sync_core::{Todo, TodoDataService, TodoId};
use todo_sync_runtime::stages::TODOS_KEY;
use todo_sync_runtime::{
    BroadcastDataService, ClosureDataService, DelegateDataService, EventBus,
    PersistedDataService, PropertyDataService, ReactiveDataService, SharedDataService,
};
use todo_sync_testing::{InMemoryKeyValueStore, test_environment};

/// Short enough to keep async tests fast
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(20);

/// Todos with fixed ids and the given titles
pub fn todos(titles: &[&str]) -> Vec<Todo> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| Todo::new(TodoId::from_string(format!("seed-{i}")), *title))
        .collect()
}

/// One service per implemented stage, each starting with `titles`
pub fn every_stage_with(titles: &[&str]) -> Vec<Arc<dyn TodoDataService>> {
    let seed = todos(titles);
    let bus = Arc::new(EventBus::new());
    let stored = serde_json::to_string(&seed).unwrap_or_default();
    let store = InMemoryKeyValueStore::with_entries(&[(TODOS_KEY, stored.as_str())]);

    vec![
        Arc::new(PropertyDataService::with_todos(test_environment(), seed.clone())),
        Arc::new(DelegateDataService::with_todos(test_environment(), seed.clone())),
        Arc::new(ClosureDataService::with_todos(test_environment(), seed.clone())),
        Arc::new(BroadcastDataService::with_todos(
            test_environment(),
            Arc::clone(&bus),
            seed.clone(),
        )),
        Arc::new(SharedDataService::with_todos(
            test_environment(),
            Arc::clone(&bus),
            seed.clone(),
        )),
        Arc::new(PersistedDataService::open(
            test_environment(),
            Arc::clone(&bus),
            Arc::new(store),
        )),
        Arc::new(ReactiveDataService::with_todos(
            test_environment(),
            bus,
            TEST_DEBOUNCE,
            seed,
        )),
    ]
}
