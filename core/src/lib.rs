//! # Todo Sync Core
//!
//! Core traits and types shared by every todo-sync stage.
//!
//! The same Todo list feature is implemented several times, each time
//! propagating changes with a different technique. This crate holds the
//! pieces those implementations agree on.
//!
//! ## Core Concepts
//!
//! - **Todo**: identifier + title + completion flag
//! - **Stage**: which propagation technique is active ([`SyncStage`])
//! - **Data service**: CRUD over the in-memory list ([`TodoDataService`])
//! - **Change**: what consumers are told after a mutation ([`TodoChange`])
//! - **Environment**: injected clock and id generator
//! - **Storage**: key-value persistence for the persisted stage
//!
//! ## Example
//!
//! ```ignore
//! use todo_sync_core::{TodoDataService, TodoId};
//!
//! fn rename_first(service: &dyn TodoDataService, title: &str) {
//!     if let Some(first) = service.list().into_iter().next() {
//!         service.update(first.retitled(title));
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Dependency injection traits (clock, id generation)
pub mod environment;

/// Change descriptions published by data services
pub mod event;

/// The `TodoDataService` contract and observer types
pub mod service;

/// Stage catalogue and capabilities
pub mod stage;

/// Key-value storage abstraction
pub mod storage;

/// The Todo entity
pub mod todo;

pub use environment::{Clock, IdGenerator, ServiceEnvironment, SystemClock, UuidGenerator};
pub use event::{Operation, TodoChange, TodoEvent, UiUpdate};
pub use service::{BadgeCallback, ChangeObserver, ObserverId, TodoDataService};
pub use stage::{ParseStageError, SyncCapability, SyncStage};
pub use storage::{KeyValueStore, Result as StorageResult, StorageError};
pub use todo::{Todo, TodoId};
