//! # Todo Sync Runtime
//!
//! Data services, propagation plumbing and view models for todo-sync.
//!
//! ## Core Components
//!
//! - **Data services**: one [`TodoDataService`](todo_sync_core::TodoDataService)
//!   implementation per stage, in [`stages`]
//! - **Event bus**: typed topics with sync handlers and async listeners
//! - **Subjects**: latest-value and event subjects with RAII subscriptions
//! - **View models**: list, detail and add screens
//! - **Container**: builds the configured stage and hands out view models
//!
//! ## Example
//!
//! ```ignore
//! use todo_sync_runtime::{ContainerConfig, ServiceContainer};
//! use todo_sync_core::SyncStage;
//!
//! let container = ServiceContainer::builder(ContainerConfig::for_stage(SyncStage::Stage4))
//!     .build()?;
//!
//! let list = container.create_list_view_model();
//! list.set_badge_update_handler(Arc::new(|count: usize| println!("badge: {count}")));
//! container.create_add_view_model().add_todo("Write tests")?;
//!
//! container.shutdown();
//! ```

/// Handle-keyed subscriber registry
pub mod registry;

/// Reactive subjects, subscriptions and debounce
pub mod subject;

/// Typed in-process event bus
pub mod event_bus;

/// Badge counter shared by the broadcast-style stages
pub mod badge;

/// The in-memory todo list and per-stage seed titles
pub mod list;

/// Prometheus metrics
pub mod metrics;

/// File-backed key-value store
pub mod storage;

/// The seven data services
pub mod stages;

/// List, detail and add view models
pub mod view_model;

/// Container configuration
pub mod config;

/// Composition root
pub mod container;

/// Error types for the runtime
pub mod error {
    use thiserror::Error;
    use todo_sync_core::{StorageError, SyncStage};

    /// Errors that can occur while building a container
    #[derive(Error, Debug)]
    pub enum ContainerError {
        /// The configured stage is declared but has no data service
        #[error("{0} is not implemented yet")]
        StageNotImplemented(SyncStage),

        /// The persisted stage's store could not be opened
        #[error("Storage unavailable: {0}")]
        Storage(#[from] StorageError),

        /// Configuration could not be loaded
        #[error("Invalid configuration: {0}")]
        Config(#[from] ConfigError),
    }

    /// Errors from loading [`ContainerConfig`](crate::config::ContainerConfig)
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ConfigError {
        /// The stage variable names no known stage
        #[error("Unknown stage '{0}'")]
        InvalidStage(String),

        /// A numeric variable is not a number
        #[error("{variable} must be a non-negative integer, got '{value}'")]
        InvalidNumber {
            /// Variable name
            variable: &'static str,
            /// Rejected value
            value: String,
        },
    }

    /// Input rejected by a view model
    #[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ValidationError {
        /// Title is empty or only whitespace
        #[error("Title must not be empty")]
        EmptyTitle,
    }
}

pub use badge::BadgeCounter;
pub use config::ContainerConfig;
pub use container::{ServiceContainer, ServiceContainerBuilder};
pub use error::{ConfigError, ContainerError, ValidationError};
pub use event_bus::{EventBus, Topic};
pub use list::{SharedList, TodoList, default_titles};
pub use stages::{
    BroadcastDataService, ClosureDataService, DelegateDataService, PersistedDataService,
    PersistenceStatistics, PropertyDataService, ReactiveDataService, ReactiveStatistics,
    SharedDataService, SharedStatistics,
};
pub use storage::FileKeyValueStore;
pub use subject::{EventSubject, StateSubject, Subscription, debounce};
pub use view_model::{
    AddTodoViewModel, CallbackTodoListViewModel, ReactiveTodoListViewModel, TodoDetailViewModel,
    TodoListViewModel,
};
