//! Integration tests for the service container and the view models it
//! hands out

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::{Arc, Mutex};
use todo_sync_core::{SyncCapability, SyncStage, TodoDataService};
use todo_sync_runtime::{
    ContainerConfig, ContainerError, EventBus, ServiceContainer, ValidationError, default_titles,
};
use todo_sync_testing::{InMemoryKeyValueStore, test_environment};

fn container(stage: SyncStage) -> ServiceContainer {
    ServiceContainer::builder(ContainerConfig::for_stage(stage))
        .environment(test_environment())
        .store(Arc::new(InMemoryKeyValueStore::new()))
        .build()
        .unwrap()
}

#[test]
fn builds_every_implemented_stage() {
    for stage in ServiceContainer::available_stages() {
        let container = container(stage);

        assert_eq!(container.stage(), stage);
        assert!(container.validate_configuration());
        assert_eq!(container.data_service().list().len(), default_titles(stage).len());
        assert_eq!(container.uses_reactive_view_model(), stage == SyncStage::Stage7);
        assert_eq!(container.reactive_service().is_some(), stage == SyncStage::Stage7);
        container.shutdown();
    }
}

#[test]
fn planned_stage_is_rejected() {
    let result = ServiceContainer::builder(ContainerConfig::for_stage(SyncStage::Stage8)).build();

    assert!(matches!(
        result,
        Err(ContainerError::StageNotImplemented(SyncStage::Stage8))
    ));
    assert!(!ServiceContainer::available_stages().contains(&SyncStage::Stage8));
    assert_eq!(ServiceContainer::available_stages().len(), 7);
}

#[test]
fn capabilities_follow_stage() {
    assert!(!container(SyncStage::Stage2).is_badge_supported());
    assert!(container(SyncStage::Stage4).is_badge_supported());
    assert_eq!(container(SyncStage::Stage3).sync_capability(), SyncCapability::Manual);
    assert_eq!(container(SyncStage::Stage6).sync_capability(), SyncCapability::Automatic);
    assert_eq!(container(SyncStage::Stage7).sync_capability(), SyncCapability::Reactive);
}

#[test]
fn describe_names_the_stage_and_its_behaviour() {
    let text = container(SyncStage::Stage4).describe();

    assert!(text.starts_with("Stage4: Broadcast event bus (3/5)"));
    assert!(text.contains("Badge: yes"));
    assert!(text.contains("Todos: 3"));
    assert!(text.contains(SyncStage::Stage4.instructions()));
}

#[test]
fn injected_bus_is_used() {
    let bus = Arc::new(EventBus::new());
    let container = ServiceContainer::builder(ContainerConfig::for_stage(SyncStage::Stage5))
        .environment(test_environment())
        .event_bus(Arc::clone(&bus))
        .build()
        .unwrap();

    assert!(Arc::ptr_eq(&container.event_bus(), &bus));
    assert_eq!(bus.todo_events().handler_count(), 1);
}

#[test]
fn injected_store_backs_the_persisted_stage() {
    let store = InMemoryKeyValueStore::new();
    let container = ServiceContainer::builder(ContainerConfig::for_stage(SyncStage::Stage6))
        .environment(test_environment())
        .store(Arc::new(store.clone()))
        .build()
        .unwrap();

    container.data_service().add("Stored");

    assert!(!store.is_empty());
}

#[test]
fn list_badge_counts_additions_until_viewed() {
    for stage in [SyncStage::Stage4, SyncStage::Stage5, SyncStage::Stage6, SyncStage::Stage7] {
        let container = container(stage);
        let list = container.create_list_view_model();
        let add = container.create_add_view_model();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        list.set_badge_update_handler(Arc::new(move |count: usize| sink.lock().unwrap().push(count)));

        add.add_todo("One").unwrap();
        add.add_todo("Two").unwrap();
        assert_eq!(list.badge_count(), 2, "{stage}");

        list.mark_badge_as_viewed();

        assert_eq!(list.badge_count(), 0, "{stage}");
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 0], "{stage}");
    }
}

#[test]
fn list_badge_stays_zero_without_support() {
    for stage in [SyncStage::Stage1, SyncStage::Stage2, SyncStage::Stage3] {
        let container = container(stage);
        let list = container.create_list_view_model();

        list.add_todo("Ignored by the badge");

        assert_eq!(list.badge_count(), 0);
        assert_eq!(list.todos().len(), 4);
    }
}

#[test]
fn view_models_share_one_list() {
    let container = container(SyncStage::Stage5);
    let list = container.create_list_view_model();
    let add = container.create_add_view_model();

    let added = add.add_todo("  Padded title  ").unwrap();
    let detail = container.create_detail_view_model(added.id.clone());
    detail.toggle_completion();
    detail.update_title("Renamed").unwrap();

    let shown = list.todo_by_id(&added.id).unwrap();
    assert_eq!(shown.title, "Renamed");
    assert!(shown.completed);

    assert!(detail.delete().is_some());
    assert!(list.todo_by_id(&added.id).is_none());
    assert!(detail.todo().is_none());
}

#[test]
fn blank_titles_are_rejected() {
    let container = container(SyncStage::Stage2);
    let add = container.create_add_view_model();
    let first = container.data_service().list()[0].clone();
    let detail = container.create_detail_view_model(first.id.clone());

    assert_eq!(add.add_todo("   "), Err(ValidationError::EmptyTitle));
    assert_eq!(detail.update_title(""), Err(ValidationError::EmptyTitle));
    assert_eq!(container.data_service().list().len(), 3);
    assert_eq!(detail.todo().unwrap().title, first.title);
}

#[test]
fn index_operations_ignore_out_of_range() {
    let container = container(SyncStage::Stage1);
    let list = container.create_list_view_model();

    assert!(list.todo_at(3).is_none());
    assert!(list.delete_at(3).is_none());
    assert!(list.toggle_completion_at(3).is_none());
    assert!(list.toggle_completion_at(0).unwrap().completed);
}

#[test]
fn dropping_list_view_model_releases_its_binding() {
    let container = container(SyncStage::Stage4);
    let bus = container.event_bus();
    let before = bus.todo_events().handler_count();

    let list = container.create_list_view_model();
    assert_eq!(bus.todo_events().handler_count(), before + 1);
    drop(list);

    assert_eq!(bus.todo_events().handler_count(), before);
}

#[test]
fn dropping_reactive_list_view_model_releases_its_binding() {
    let container = container(SyncStage::Stage7);
    let service = container.reactive_service().unwrap();
    let before = service.operations().subscriber_count();

    let list = container.create_list_view_model();
    assert_eq!(service.operations().subscriber_count(), before + 1);
    drop(list);

    assert_eq!(service.operations().subscriber_count(), before);
}

#[test]
fn shutdown_disposes_the_service() {
    let container = container(SyncStage::Stage4);
    container.shutdown();

    assert_eq!(container.event_bus().todo_events().handler_count(), 0);
    assert_eq!(container.data_service().list().len(), 3);
}

#[test]
fn config_from_lookup_drives_the_container() {
    let config = ContainerConfig::from_lookup(|name| match name {
        "TODO_SYNC_STAGE" => Some("closure".to_string()),
        _ => None,
    })
    .unwrap();

    let container = ServiceContainer::builder(config).build().unwrap();

    assert_eq!(container.stage(), SyncStage::Stage3);
    let service: Arc<dyn TodoDataService> = container.data_service();
    assert_eq!(service.list().len(), default_titles(SyncStage::Stage3).len());
}
