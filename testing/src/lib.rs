//! # Todo Sync Testing
//!
//! Testing utilities and helpers for todo-sync data services.
//!
//! This crate provides:
//! - Mock implementations of the environment traits
//! - An in-memory key-value store and a recording observer
//! - A fluent Given/When/Then harness for any `TodoDataService`
//! - proptest strategies for titles and operation sequences
//!
//! ## Example
//!
//! ```ignore
//! use todo_sync_testing::{ServiceTest, test_environment};
//! use todo_sync_runtime::DelegateDataService;
//!
//! #[test]
//! fn adding_notifies_observers() {
//!     let service = DelegateDataService::new(test_environment());
//!
//!     ServiceTest::new(Arc::new(service))
//!         .observing()
//!         .when_add("New Task")
//!         .then_titles(&["New Task"])
//!         .then_changes(|changes| assert_eq!(changes.len(), 1))
//!         .run();
//! }
//! ```

use chrono::{DateTime, Utc};
use todo_sync_core::environment::{Clock, IdGenerator};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use todo_sync_core::{ServiceEnvironment, TodoId};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use todo_sync_testing::mocks::FixedClock;
    /// use todo_sync_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable ids: `todo-1`, `todo-2`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Start counting at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> TodoId {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            TodoId::from_string(format!("todo-{n}"))
        }
    }

    /// Environment with [`test_clock`] and a fresh [`SequentialIdGenerator`]
    #[must_use]
    pub fn test_environment() -> ServiceEnvironment {
        ServiceEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
        )
    }
}

/// In-memory store and recording observer
pub mod store_mocks;

/// Given/When/Then harness for data services
pub mod service_test;

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// One mutation in a generated sequence
    #[derive(Debug, Clone)]
    pub enum Step {
        /// Add a todo with this title
        Add(String),
        /// Delete the todo at `index % len`, or an unknown id when empty
        Delete(usize),
        /// Toggle the todo at `index % len`
        Toggle(usize),
        /// Delete an id that was never handed out
        DeleteUnknown,
    }

    /// Non-blank titles of printable characters
    pub fn title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 .,!?-]{0,30}"
    }

    /// A single step
    pub fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => title().prop_map(Step::Add),
            2 => any::<usize>().prop_map(Step::Delete),
            2 => any::<usize>().prop_map(Step::Toggle),
            1 => Just(Step::DeleteUnknown),
        ]
    }

    /// Up to `max` steps
    pub fn steps(max: usize) -> impl Strategy<Value = Vec<Step>> {
        prop::collection::vec(step(), 0..=max)
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialIdGenerator, test_clock, test_environment};
pub use service_test::{ServiceTest, assertions};
pub use store_mocks::{InMemoryKeyValueStore, RecordingObserver};
