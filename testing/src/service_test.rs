//! Ergonomic testing utilities for data services
//!
//! This module provides a fluent API for testing any `TodoDataService` with
//! readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ServiceTest is the natural name

use crate::store_mocks::RecordingObserver;
use std::sync::Arc;
use todo_sync_core::{ChangeObserver, Todo, TodoChange, TodoDataService, TodoId};

/// Type alias for list assertion functions
type ListAssertion = Box<dyn FnOnce(&[Todo])>;

/// Type alias for change assertion functions
type ChangeAssertion = Box<dyn FnOnce(&[TodoChange])>;

/// Type alias for custom steps
type CustomStep = Box<dyn FnOnce(&dyn TodoDataService)>;

enum Step {
    Add(String),
    DeleteAt(usize),
    DeleteId(TodoId),
    ToggleAt(usize),
    Custom(CustomStep),
}

/// Fluent API for testing data services with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use todo_sync_testing::ServiceTest;
///
/// ServiceTest::new(service)
///     .given_titles(&["Learn X", "Finish Y", "Prepare Z"])
///     .when_add("New Task")
///     .then_list(|todos| assert_eq!(todos.len(), 4))
///     .then_badge(1)
///     .run();
/// ```
pub struct ServiceTest {
    service: Arc<dyn TodoDataService>,
    given_titles: Option<Vec<String>>,
    observe: bool,
    steps: Vec<Step>,
    list_assertions: Vec<ListAssertion>,
    change_assertions: Vec<ChangeAssertion>,
    expected_badge: Option<usize>,
}

impl ServiceTest {
    /// Create a new test against `service`
    #[must_use]
    pub fn new(service: Arc<dyn TodoDataService>) -> Self {
        Self {
            service,
            given_titles: None,
            observe: false,
            steps: Vec::new(),
            list_assertions: Vec::new(),
            change_assertions: Vec::new(),
            expected_badge: None,
        }
    }

    /// Check the starting titles before running any step (Given)
    #[must_use]
    pub fn given_titles(mut self, titles: &[&str]) -> Self {
        self.given_titles = Some(titles.iter().map(|t| (*t).to_string()).collect());
        self
    }

    /// Bind a [`RecordingObserver`] before the steps run
    #[must_use]
    pub const fn observing(mut self) -> Self {
        self.observe = true;
        self
    }

    /// Add a todo (When)
    #[must_use]
    pub fn when_add(mut self, title: &str) -> Self {
        self.steps.push(Step::Add(title.to_string()));
        self
    }

    /// Delete the todo at `index` of the current list (When)
    #[must_use]
    pub fn when_delete_at(mut self, index: usize) -> Self {
        self.steps.push(Step::DeleteAt(index));
        self
    }

    /// Delete by id (When)
    #[must_use]
    pub fn when_delete_id(mut self, id: impl Into<TodoId>) -> Self {
        self.steps.push(Step::DeleteId(id.into()));
        self
    }

    /// Toggle completion of the todo at `index` (When)
    #[must_use]
    pub fn when_toggle_at(mut self, index: usize) -> Self {
        self.steps.push(Step::ToggleAt(index));
        self
    }

    /// Run arbitrary code against the service (When)
    #[must_use]
    pub fn when<F>(mut self, step: F) -> Self
    where
        F: FnOnce(&dyn TodoDataService) + 'static,
    {
        self.steps.push(Step::Custom(Box::new(step)));
        self
    }

    /// Add an assertion about the resulting list (Then)
    #[must_use]
    pub fn then_list<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Todo]) + 'static,
    {
        self.list_assertions.push(Box::new(assertion));
        self
    }

    /// Assert the resulting titles in order (Then)
    #[must_use]
    pub fn then_titles(self, expected: &[&str]) -> Self {
        let expected: Vec<String> = expected.iter().map(|t| (*t).to_string()).collect();
        self.then_list(move |todos| {
            let refs: Vec<&str> = expected.iter().map(String::as_str).collect();
            assertions::assert_titles(todos, &refs);
        })
    }

    /// Add an assertion about the changes the observer saw (Then).
    ///
    /// Implies [`observing`](Self::observing).
    #[must_use]
    pub fn then_changes<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[TodoChange]) + 'static,
    {
        self.observe = true;
        self.change_assertions.push(Box::new(assertion));
        self
    }

    /// Assert the resulting badge value (Then)
    #[must_use]
    pub const fn then_badge(mut self, expected: usize) -> Self {
        self.expected_badge = Some(expected);
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if the starting titles differ from `given_titles`, if an
    /// index step is out of range, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let service = self.service;

        if let Some(expected) = &self.given_titles {
            let refs: Vec<&str> = expected.iter().map(String::as_str).collect();
            assertions::assert_titles(&service.list(), &refs);
        }

        let recorder = RecordingObserver::new();
        let observer: Arc<dyn ChangeObserver> = Arc::clone(&recorder) as Arc<dyn ChangeObserver>;
        let binding = self.observe.then(|| service.bind_consumer(observer));

        for step in self.steps {
            match step {
                Step::Add(title) => {
                    service.add(&title);
                }
                Step::DeleteAt(index) => {
                    let todo = service
                        .list()
                        .into_iter()
                        .nth(index)
                        .expect("delete index out of range");
                    service.delete_by_id(&todo.id);
                }
                Step::DeleteId(id) => {
                    service.delete_by_id(&id);
                }
                Step::ToggleAt(index) => {
                    let todo = service
                        .list()
                        .into_iter()
                        .nth(index)
                        .expect("toggle index out of range");
                    service.update(todo.toggled());
                }
                Step::Custom(step) => step(service.as_ref()),
            }
        }

        let todos = service.list();
        assertions::assert_unique_ids(&todos);
        for assertion in self.list_assertions {
            assertion(&todos);
        }

        let changes = recorder.changes();
        for assertion in self.change_assertions {
            assertion(&changes);
        }

        if let Some(expected) = self.expected_badge {
            assert_eq!(service.badge_count(), expected, "Unexpected badge count");
        }

        if let Some(id) = binding {
            service.unbind_consumer(id);
        }
    }
}

/// Helper assertions for todo lists and changes
pub mod assertions {
    use std::collections::HashSet;
    use todo_sync_core::{Operation, Todo, TodoChange};

    /// Assert the titles, in order
    ///
    /// # Panics
    ///
    /// Panics if the titles differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_titles(todos: &[Todo], expected: &[&str]) {
        let actual: Vec<&str> = todos.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(actual, expected, "Unexpected titles");
    }

    /// Assert that no two todos share an id
    ///
    /// # Panics
    ///
    /// Panics on a duplicate id.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_unique_ids(todos: &[Todo]) {
        let mut seen = HashSet::new();
        for todo in todos {
            assert!(seen.insert(&todo.id), "Duplicate todo id {}", todo.id);
        }
    }

    /// Assert the sequence of operations
    ///
    /// # Panics
    ///
    /// Panics if the operations differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_operations(changes: &[TodoChange], expected: &[Operation]) {
        let actual: Vec<Operation> = changes.iter().map(|c| c.operation).collect();
        assert_eq!(actual, expected, "Unexpected operations");
    }

    /// Assert that `after` equals `before` with exactly the todo at `index`
    /// removed
    ///
    /// # Panics
    ///
    /// Panics if anything else changed.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_removed_at(before: &[Todo], after: &[Todo], index: usize) {
        let mut expected = before.to_vec();
        expected.remove(index);
        assert_eq!(after, expected.as_slice(), "Delete changed more than one entry");
    }
}
