//! Composition root.
//!
//! The container reads a [`ContainerConfig`], builds exactly one data
//! service for the configured stage and hands out view models bound to it.
//! The stage is fixed for the container's lifetime.

use crate::config::ContainerConfig;
use crate::error::ContainerError;
use crate::event_bus::EventBus;
use crate::stages::{
    BroadcastDataService, ClosureDataService, DelegateDataService, PersistedDataService,
    PropertyDataService, ReactiveDataService, SharedDataService,
};
use crate::storage::FileKeyValueStore;
use crate::view_model::{
    AddTodoViewModel, CallbackTodoListViewModel, ReactiveTodoListViewModel, TodoDetailViewModel,
    TodoListViewModel,
};
use std::fmt::Write as _;
use std::sync::Arc;
use todo_sync_core::{
    KeyValueStore, ServiceEnvironment, SyncCapability, SyncStage, TodoDataService, TodoId,
};

enum ActiveService {
    Callback(Arc<dyn TodoDataService>),
    Reactive(Arc<ReactiveDataService>),
}

impl ActiveService {
    fn as_dyn(&self) -> Arc<dyn TodoDataService> {
        match self {
            Self::Callback(service) => Arc::clone(service),
            Self::Reactive(service) => Arc::clone(service) as Arc<dyn TodoDataService>,
        }
    }
}

/// Builder for [`ServiceContainer`]
pub struct ServiceContainerBuilder {
    config: ContainerConfig,
    environment: Option<ServiceEnvironment>,
    store: Option<Arc<dyn KeyValueStore>>,
    event_bus: Option<Arc<EventBus>>,
}

impl ServiceContainerBuilder {
    /// Use `environment` instead of the system clock and UUID ids
    #[must_use]
    pub fn environment(mut self, environment: ServiceEnvironment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Use `store` for the persisted stage instead of opening the configured file
    #[must_use]
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an existing bus instead of creating one
    #[must_use]
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Build the container and its data service.
    ///
    /// Must be called inside a tokio runtime when the stage is reactive.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::StageNotImplemented`] for a planned stage
    /// and [`ContainerError::Storage`] if the persisted stage's file cannot
    /// be opened.
    pub fn build(self) -> Result<ServiceContainer, ContainerError> {
        let config = self.config;
        let env = self.environment.unwrap_or_default();
        let bus = self
            .event_bus
            .unwrap_or_else(|| Arc::new(EventBus::with_capacity(config.bus_capacity)));

        let service = match config.stage {
            SyncStage::Stage1 => ActiveService::Callback(Arc::new(PropertyDataService::new(env))),
            SyncStage::Stage2 => ActiveService::Callback(Arc::new(DelegateDataService::new(env))),
            SyncStage::Stage3 => ActiveService::Callback(Arc::new(ClosureDataService::new(env))),
            SyncStage::Stage4 => ActiveService::Callback(Arc::new(BroadcastDataService::new(
                env,
                Arc::clone(&bus),
            ))),
            SyncStage::Stage5 => ActiveService::Callback(Arc::new(SharedDataService::new(
                env,
                Arc::clone(&bus),
            ))),
            SyncStage::Stage6 => {
                let store = match self.store {
                    Some(store) => store,
                    None => Arc::new(FileKeyValueStore::open(&config.storage_path)?),
                };
                ActiveService::Callback(Arc::new(PersistedDataService::open(
                    env,
                    Arc::clone(&bus),
                    store,
                )))
            }
            SyncStage::Stage7 => ActiveService::Reactive(Arc::new(ReactiveDataService::new(
                env,
                Arc::clone(&bus),
                config.ui_debounce,
            ))),
            SyncStage::Stage8 => {
                tracing::error!(stage = %config.stage, "Stage has no data service");
                return Err(ContainerError::StageNotImplemented(config.stage));
            }
        };

        tracing::info!(
            stage = %config.stage,
            capability = %config.stage.sync_capability(),
            badge = config.stage.badge_supported(),
            "Service container built"
        );
        Ok(ServiceContainer {
            config,
            bus,
            service,
        })
    }
}

/// Owns the event bus and the one data service of the configured stage
pub struct ServiceContainer {
    config: ContainerConfig,
    bus: Arc<EventBus>,
    service: ActiveService,
}

impl ServiceContainer {
    /// Start building a container for `config`
    #[must_use]
    pub const fn builder(config: ContainerConfig) -> ServiceContainerBuilder {
        ServiceContainerBuilder {
            config,
            environment: None,
            store: None,
            event_bus: None,
        }
    }

    /// Build a container from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Config`] for unusable variables, otherwise
    /// the errors of [`ServiceContainerBuilder::build`].
    pub fn from_env() -> Result<Self, ContainerError> {
        Self::builder(ContainerConfig::from_env()?).build()
    }

    /// Configuration the container was built with
    #[must_use]
    pub const fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The data service
    #[must_use]
    pub fn data_service(&self) -> Arc<dyn TodoDataService> {
        self.service.as_dyn()
    }

    /// The data service as its reactive type, when the stage is reactive
    #[must_use]
    pub fn reactive_service(&self) -> Option<Arc<ReactiveDataService>> {
        match &self.service {
            ActiveService::Reactive(service) => Some(Arc::clone(service)),
            ActiveService::Callback(_) => None,
        }
    }

    /// The event bus
    #[must_use]
    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Active stage
    #[must_use]
    pub const fn stage(&self) -> SyncStage {
        self.config.stage
    }

    /// Whether the list screen should show a badge
    #[must_use]
    pub const fn is_badge_supported(&self) -> bool {
        self.config.stage.badge_supported()
    }

    /// Whether list view models are reactive
    #[must_use]
    pub const fn uses_reactive_view_model(&self) -> bool {
        matches!(self.service, ActiveService::Reactive(_))
    }

    /// How the active stage propagates changes
    #[must_use]
    pub const fn sync_capability(&self) -> SyncCapability {
        self.config.stage.sync_capability()
    }

    /// Whether the built service implements the configured stage
    #[must_use]
    pub fn validate_configuration(&self) -> bool {
        let actual = self.data_service().stage();
        let valid = actual == self.config.stage;
        if !valid {
            tracing::warn!(configured = %self.config.stage, actual = %actual, "Service does not match configured stage");
        }
        valid
    }

    /// Human-readable summary of the active stage
    #[must_use]
    pub fn describe(&self) -> String {
        let stage = self.config.stage;
        let mut out = stage.full_description();
        let _ = write!(
            out,
            "\nSync: {}\nBadge: {}\nReactive view model: {}\nTodos: {}",
            stage.sync_capability(),
            if stage.badge_supported() { "yes" } else { "no" },
            if self.uses_reactive_view_model() { "yes" } else { "no" },
            self.data_service().list().len(),
        );
        let _ = write!(out, "\n\n{}", stage.instructions());
        out
    }

    /// Stages a container can be built for
    #[must_use]
    pub fn available_stages() -> Vec<SyncStage> {
        SyncStage::ALL
            .into_iter()
            .filter(|stage| stage.is_implemented())
            .collect()
    }

    /// View model for the list screen
    #[must_use]
    pub fn create_list_view_model(&self) -> Box<dyn TodoListViewModel> {
        match &self.service {
            ActiveService::Reactive(service) => {
                Box::new(ReactiveTodoListViewModel::new(Arc::clone(service)))
            }
            ActiveService::Callback(service) => {
                Box::new(CallbackTodoListViewModel::new(Arc::clone(service)))
            }
        }
    }

    /// View model for the detail screen of `todo_id`
    #[must_use]
    pub fn create_detail_view_model(&self, todo_id: TodoId) -> TodoDetailViewModel {
        TodoDetailViewModel::new(self.data_service(), todo_id)
    }

    /// View model for the add screen
    #[must_use]
    pub fn create_add_view_model(&self) -> AddTodoViewModel {
        AddTodoViewModel::new(self.data_service())
    }

    /// Dispose the data service
    pub fn shutdown(&self) {
        self.data_service().dispose();
        tracing::info!(stage = %self.config.stage, "Service container shut down");
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("config", &self.config)
            .field("reactive", &self.uses_reactive_view_model())
            .finish_non_exhaustive()
    }
}
