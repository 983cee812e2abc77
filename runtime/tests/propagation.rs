//! Integration tests for how each stage delivers changes to the screens

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

mod common;

use common::{TEST_DEBOUNCE, todos};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use todo_sync_core::{ChangeObserver, Operation, SyncStage, TodoChange, TodoDataService};
use todo_sync_runtime::{
    BroadcastDataService, ClosureDataService, DelegateDataService, EventBus, ReactiveDataService,
    SharedDataService,
};
use todo_sync_testing::{RecordingObserver, test_environment};
use tokio::sync::broadcast::error::TryRecvError;

fn counter() -> (Arc<AtomicUsize>, Arc<dyn ChangeObserver>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let observer: Arc<dyn ChangeObserver> = Arc::new(move |_: &TodoChange| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (calls, observer)
}

#[test]
fn delegate_notifies_every_registered_observer_until_unbound() {
    let service = DelegateDataService::new(test_environment());
    let first = RecordingObserver::new();
    let second = RecordingObserver::new();
    let first_id = service.bind_consumer(first.clone());
    service.bind_consumer(second.clone());

    service.add("Both hear this");
    service.unbind_consumer(first_id);
    service.add("Only the second");

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 2);
    assert_eq!(service.observer_count(), 1);
}

#[test]
fn closure_keeps_only_the_latest_callback() {
    let service = ClosureDataService::new(test_environment());
    let (old_calls, old) = counter();
    let (new_calls, new) = counter();

    let old_id = service.bind_consumer(old);
    service.bind_consumer(new);
    service.unbind_consumer(old_id);
    service.add("Replaced");

    assert_eq!(old_calls.load(Ordering::SeqCst), 0);
    assert_eq!(new_calls.load(Ordering::SeqCst), 1);
    assert!(service.has_callback());
}

#[test]
fn observers_may_read_the_service_while_notified() {
    let service = Arc::new(DelegateDataService::new(test_environment()));
    let totals = Arc::new(Mutex::new(Vec::new()));
    let weak = Arc::downgrade(&service);
    let sink = Arc::clone(&totals);
    service.bind_consumer(Arc::new(move |_: &TodoChange| {
        if let Some(service) = weak.upgrade() {
            sink.lock().unwrap().push(service.list().len());
        }
    }));

    service.add("Re-entrant read");

    assert_eq!(*totals.lock().unwrap(), vec![4]);
}

#[tokio::test]
async fn broadcast_publishes_one_ui_update_per_mutation() {
    let bus = Arc::new(EventBus::new());
    let service = BroadcastDataService::with_todos(
        test_environment(),
        Arc::clone(&bus),
        todos(&["Learn X", "Finish Y", "Prepare Z"]),
    );
    let mut screen = bus.ui_updates().listen();

    let added = service.add("Ship it");
    service.delete_by_id(&added.id);

    let first = screen.recv().await.unwrap();
    let second = screen.recv().await.unwrap();
    assert_eq!((first.operation, first.count, first.badge_count), (Operation::Add, 4, 1));
    assert_eq!((second.operation, second.count), (Operation::Delete, 3));
    assert!(matches!(screen.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn stages_on_one_bus_do_not_cross_talk() {
    let bus = Arc::new(EventBus::new());
    let broadcast = BroadcastDataService::with_todos(test_environment(), Arc::clone(&bus), vec![]);
    let shared = SharedDataService::with_todos(test_environment(), Arc::clone(&bus), vec![]);
    let recorder = RecordingObserver::new();
    broadcast.bind_consumer(recorder.clone());

    shared.add("Shared only");
    broadcast.add("Broadcast only");

    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.changes()[0].todo.title, "Broadcast only");
    assert_eq!(broadcast.badge_count(), 1);
    assert_eq!(shared.badge_count(), 1);
}

#[test]
fn shared_statistics_count_reads_and_changes() {
    let service = SharedDataService::new(test_environment(), Arc::new(EventBus::new()));
    service.list();
    service.list();
    let added = service.add("Counted");
    service.update(added.toggled());
    service.delete_by_id(&todo_sync_core::TodoId::from("missing"));

    let stats = service.statistics();
    assert_eq!(stats.access_count, 2);
    assert_eq!(stats.change_count, 2);
    assert_eq!(stats.todo_count, 4);
    assert_eq!(stats.instance_id, service.instance_id());
}

#[test]
fn badge_subscribers_get_current_value_then_changes() {
    let service = BroadcastDataService::new(test_environment(), Arc::new(EventBus::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = service
        .subscribe_badge(Arc::new(move |count: usize| sink.lock().unwrap().push(count)))
        .unwrap();

    service.add("One");
    service.clear_badge();
    service.unsubscribe_badge(id);
    service.add("Unseen");

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 0]);
    assert_eq!(service.badge_count(), 1);
}

#[tokio::test]
async fn reactive_burst_yields_a_single_ui_update() {
    let bus = Arc::new(EventBus::new());
    let service = ReactiveDataService::with_todos(
        test_environment(),
        Arc::clone(&bus),
        TEST_DEBOUNCE,
        todos(&["Learn X"]),
    );
    let mut screen = bus.ui_updates().listen();

    let a = service.add("A");
    service.add("B");
    service.delete_by_id(&a.id);
    tokio::time::sleep(TEST_DEBOUNCE * 5).await;

    let update = screen.recv().await.unwrap();
    assert_eq!(update.stage, SyncStage::Stage7);
    assert_eq!(update.operation, Operation::Delete);
    assert_eq!((update.count, update.badge_count), (2, 2));
    assert!(matches!(screen.try_recv(), Err(TryRecvError::Empty)));

    let stats = service.statistics();
    assert_eq!(stats.total_operations, 3);
    assert_eq!(stats.ui_updates, 1);
}

#[tokio::test]
async fn reactive_three_rapid_adds_publish_once() {
    let bus = Arc::new(EventBus::new());
    let service =
        ReactiveDataService::with_todos(test_environment(), Arc::clone(&bus), TEST_DEBOUNCE, vec![]);
    let mut screen = bus.ui_updates().listen();

    for title in ["One", "Two", "Three"] {
        service.add(title);
    }
    tokio::time::sleep(TEST_DEBOUNCE * 5).await;

    assert_eq!(screen.recv().await.unwrap().count, 3);
    assert!(matches!(screen.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(service.badge_count(), 3);
}

#[tokio::test]
async fn reactive_separate_bursts_yield_separate_updates() {
    let bus = Arc::new(EventBus::new());
    let service =
        ReactiveDataService::with_todos(test_environment(), Arc::clone(&bus), TEST_DEBOUNCE, vec![]);
    let mut screen = bus.ui_updates().listen();

    service.add("First burst");
    tokio::time::sleep(TEST_DEBOUNCE * 5).await;
    service.add("Second burst");
    tokio::time::sleep(TEST_DEBOUNCE * 5).await;

    assert_eq!(screen.recv().await.unwrap().count, 1);
    assert_eq!(screen.recv().await.unwrap().count, 2);
}

#[tokio::test]
async fn reactive_dispose_drops_pending_update() {
    let bus = Arc::new(EventBus::new());
    let service =
        ReactiveDataService::with_todos(test_environment(), Arc::clone(&bus), TEST_DEBOUNCE, vec![]);
    let mut screen = bus.ui_updates().listen();

    service.add("Never shown");
    service.dispose();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(matches!(screen.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(service.pipeline_count(), 0);
}

#[test]
fn reactive_todo_subject_replays_then_follows() {
    let service = ReactiveDataService::with_todos(
        test_environment(),
        Arc::new(EventBus::new()),
        TEST_DEBOUNCE,
        todos(&["Learn X"]),
    );
    let lengths = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lengths);
    let _subscription = service
        .todos()
        .subscribe(move |list| sink.lock().unwrap().push(list.len()));

    let added = service.add("Two");
    service.update(added.retitled("Two, renamed"));

    assert_eq!(*lengths.lock().unwrap(), vec![1, 2, 2]);
    assert_eq!(service.list()[1].title, "Two, renamed");
}
