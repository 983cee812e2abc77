//! Integration tests for the CRUD contract every stage shares
//!
//! The same scenarios run against all seven data services. They must agree
//! on list contents; only change propagation is allowed to differ.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

mod common;

use common::every_stage_with;
use proptest::prelude::*;
use todo_sync_core::{Operation, SyncStage, Todo, TodoDataService, TodoId};
use todo_sync_testing::properties::{Step, steps};
use todo_sync_testing::{RecordingObserver, ServiceTest, assertions};

const SCENARIO: [&str; 3] = ["Learn X", "Finish Y", "Prepare Z"];

#[test]
fn every_stage_is_covered() {
    let stages: Vec<SyncStage> = every_stage_with(&SCENARIO)
        .iter()
        .map(|service| service.stage())
        .collect();

    assert_eq!(stages, SyncStage::ALL[..7].to_vec());
}

#[test]
fn add_delete_toggle_scenario() {
    for service in every_stage_with(&SCENARIO) {
        let stage = service.stage();
        ServiceTest::new(service)
            .given_titles(&SCENARIO)
            .when_add("Ship it")
            .when_delete_at(1)
            .when_toggle_at(0)
            .then_titles(&["Learn X", "Prepare Z", "Ship it"])
            .then_list(move |todos| {
                assert!(todos[0].completed, "{stage}: first todo should be completed");
                assert!(!todos[1].completed, "{stage}: untouched todo changed");
                assert_eq!(todos[2].id, TodoId::from("todo-1"), "{stage}: unexpected id");
            })
            .run();
    }
}

#[test]
fn new_task_scenario() {
    for service in every_stage_with(&SCENARIO) {
        let stage = service.stage();
        service.add("New Task");
        let todos = service.list();
        assert_eq!(todos.len(), 4, "{stage}");
        assert_eq!(todos[3].title, "New Task", "{stage}");

        service.delete_by_id(&todos[0].id);
        assertions::assert_titles(&service.list(), &["Finish Y", "Prepare Z", "New Task"]);
    }
}

#[test]
fn misses_are_silent_no_ops() {
    for service in every_stage_with(&SCENARIO) {
        let before = service.list();
        let ghost = TodoId::from("never-issued");

        assert!(service.delete_by_id(&ghost).is_none());
        assert!(!service.update(Todo::new(ghost.clone(), "Ghost")));
        assert!(service.get(&ghost).is_none());
        assert_eq!(service.list(), before, "{} changed on a miss", service.stage());
    }
}

#[test]
fn delete_removes_exactly_one_entry() {
    for service in every_stage_with(&SCENARIO) {
        let before = service.list();
        let removed = service.delete_by_id(&before[1].id).unwrap();

        assert_eq!(removed.title, "Finish Y");
        assertions::assert_removed_at(&before, &service.list(), 1);
    }
}

#[test]
fn update_keeps_position_and_id() {
    for service in every_stage_with(&SCENARIO) {
        let target = service.list()[2].clone();
        assert!(service.update(target.retitled("Prepare Z properly")));

        let after = service.list();
        assert_eq!(after[2].id, target.id);
        assert_eq!(after[2].title, "Prepare Z properly");
        assert_eq!(after.len(), 3);
    }
}

#[test]
fn observers_see_operations_except_in_property_stage() {
    for service in every_stage_with(&SCENARIO) {
        let stage = service.stage();
        let recorder = RecordingObserver::new();
        let id = service.bind_consumer(recorder.clone());

        let added = service.add("Observed");
        service.update(added.toggled());
        service.delete_by_id(&added.id);
        service.unbind_consumer(id);
        service.add("After unbind");

        if stage == SyncStage::Stage1 {
            assert!(recorder.is_empty(), "property stage must not notify");
        } else {
            assertions::assert_operations(
                &recorder.changes(),
                &[Operation::Add, Operation::Update, Operation::Delete],
            );
        }
    }
}

#[test]
fn badge_follows_stage_capability() {
    for service in every_stage_with(&SCENARIO) {
        let stage = service.stage();
        let expected = if stage.badge_supported() { 2 } else { 0 };

        ServiceTest::new(service)
            .when_add("One")
            .when_add("Two")
            .when_toggle_at(0)
            .when_delete_at(0)
            .then_badge(expected)
            .run();
    }
}

#[test]
fn dispose_stops_notifications() {
    for service in every_stage_with(&SCENARIO) {
        let recorder = RecordingObserver::new();
        service.bind_consumer(recorder.clone());
        service.dispose();

        service.add("Quiet");

        assert!(recorder.is_empty(), "{} notified after dispose", service.stage());
        assert_eq!(service.list().len(), 4);
    }
}

fn apply_to_model(model: &mut Vec<(String, bool)>, step: &Step) {
    match step {
        Step::Add(title) => model.push((title.clone(), false)),
        Step::Delete(index) if !model.is_empty() => {
            let at = index % model.len();
            model.remove(at);
        }
        Step::Toggle(index) if !model.is_empty() => {
            let at = index % model.len();
            model[at].1 = !model[at].1;
        }
        Step::Delete(_) | Step::Toggle(_) | Step::DeleteUnknown => {}
    }
}

fn apply_to_service(service: &dyn TodoDataService, step: &Step) {
    let todos = service.list();
    match step {
        Step::Add(title) => {
            service.add(title);
        }
        Step::Delete(index) if !todos.is_empty() => {
            let target = &todos[index % todos.len()];
            assert!(service.delete_by_id(&target.id).is_some());
        }
        Step::Toggle(index) if !todos.is_empty() => {
            let target = &todos[index % todos.len()];
            assert!(service.update(target.toggled()));
        }
        Step::Delete(_) | Step::Toggle(_) | Step::DeleteUnknown => {
            assert!(service.delete_by_id(&TodoId::from("missing")).is_none());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn stages_agree_with_a_plain_vector(sequence in steps(24)) {
        let mut model: Vec<(String, bool)> = SCENARIO.iter().map(|t| ((*t).to_string(), false)).collect();
        for step in &sequence {
            apply_to_model(&mut model, step);
        }

        for service in every_stage_with(&SCENARIO) {
            for step in &sequence {
                apply_to_service(service.as_ref(), step);
            }

            let todos = service.list();
            assertions::assert_unique_ids(&todos);
            let actual: Vec<(String, bool)> = todos.into_iter().map(|t| (t.title, t.completed)).collect();
            prop_assert_eq!(&actual, &model, "{} diverged", service.stage());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn badge_counts_adds_between_clears(sequence in steps(32), clear_after in 0usize..32) {
        for service in every_stage_with(&SCENARIO) {
            let mut expected = 0;
            for (i, step) in sequence.iter().enumerate() {
                apply_to_service(service.as_ref(), step);
                if matches!(step, Step::Add(_)) {
                    expected += 1;
                }
                if i == clear_after {
                    service.clear_badge();
                    expected = 0;
                }
            }
            let expected = if service.stage().badge_supported() { expected } else { 0 };
            prop_assert_eq!(service.badge_count(), expected, "{}", service.stage());
        }
    }
}
