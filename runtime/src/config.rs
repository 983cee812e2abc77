//! Container configuration.
//!
//! Loads from environment variables with defaults:
//!
//! | Variable | Default |
//! |---|---|
//! | `TODO_SYNC_STAGE` | `stage7` |
//! | `TODO_SYNC_STORAGE_PATH` | `todo-sync.json` |
//! | `TODO_SYNC_DEBOUNCE_MS` | `50` |
//! | `TODO_SYNC_BUS_CAPACITY` | `64` |

use crate::error::ConfigError;
use crate::event_bus::DEFAULT_CAPACITY;
use crate::stages::DEFAULT_UI_DEBOUNCE;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use todo_sync_core::SyncStage;

/// Variable selecting the stage
pub const STAGE_VAR: &str = "TODO_SYNC_STAGE";
/// Variable holding the persisted stage's file path
pub const STORAGE_PATH_VAR: &str = "TODO_SYNC_STORAGE_PATH";
/// Variable holding the reactive UI debounce in milliseconds
pub const DEBOUNCE_MS_VAR: &str = "TODO_SYNC_DEBOUNCE_MS";
/// Variable holding the bus listener capacity
pub const BUS_CAPACITY_VAR: &str = "TODO_SYNC_BUS_CAPACITY";

const DEFAULT_STORAGE_PATH: &str = "todo-sync.json";

/// Settings fixed for the lifetime of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Stage to build
    pub stage: SyncStage,
    /// File used by the persisted stage when no store is injected
    pub storage_path: PathBuf,
    /// Quiet period before the reactive stage forwards a UI update
    pub ui_debounce: Duration,
    /// Per-listener capacity of the event bus
    pub bus_capacity: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            stage: SyncStage::Stage7,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            ui_debounce: DEFAULT_UI_DEBOUNCE,
            bus_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ContainerConfig {
    /// Defaults with a different stage
    #[must_use]
    pub fn for_stage(stage: SyncStage) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let stage = match lookup(STAGE_VAR) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidStage(raw.clone()))?,
            None => defaults.stage,
        };

        let storage_path = lookup(STORAGE_PATH_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .map_or(defaults.storage_path, PathBuf::from);

        let ui_debounce = match lookup(DEBOUNCE_MS_VAR) {
            Some(raw) => Duration::from_millis(parse_number(DEBOUNCE_MS_VAR, &raw)?),
            None => defaults.ui_debounce,
        };

        let bus_capacity = match lookup(BUS_CAPACITY_VAR) {
            Some(raw) => parse_number(BUS_CAPACITY_VAR, &raw)?,
            None => defaults.bus_capacity,
        };

        Ok(Self {
            stage,
            storage_path,
            ui_debounce,
            bus_capacity,
        })
    }
}

fn parse_number<T: std::str::FromStr>(variable: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        variable,
        value: raw.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ContainerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ContainerConfig::default());
        assert_eq!(config.stage, SyncStage::Stage7);
        assert_eq!(config.ui_debounce, Duration::from_millis(50));
        assert_eq!(config.bus_capacity, 64);
    }

    #[test]
    fn reads_every_variable() {
        let config = ContainerConfig::from_lookup(lookup(&[
            (STAGE_VAR, "persisted"),
            (STORAGE_PATH_VAR, "/tmp/todos.json"),
            (DEBOUNCE_MS_VAR, "10"),
            (BUS_CAPACITY_VAR, "8"),
        ]))
        .unwrap();

        assert_eq!(config.stage, SyncStage::Stage6);
        assert_eq!(config.storage_path, PathBuf::from("/tmp/todos.json"));
        assert_eq!(config.ui_debounce, Duration::from_millis(10));
        assert_eq!(config.bus_capacity, 8);
    }

    #[test]
    fn invalid_values_are_errors() {
        let stage = ContainerConfig::from_lookup(lookup(&[(STAGE_VAR, "stage9")]));
        assert!(matches!(stage, Err(ConfigError::InvalidStage(ref raw)) if raw == "stage9"));

        let debounce = ContainerConfig::from_lookup(lookup(&[(DEBOUNCE_MS_VAR, "soon")]));
        assert!(matches!(
            debounce,
            Err(ConfigError::InvalidNumber { variable: DEBOUNCE_MS_VAR, .. })
        ));
    }
}
