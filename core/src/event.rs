//! Change descriptions that flow from data services to their consumers.
//!
//! [`TodoChange`] is what observers and callbacks receive. [`TodoEvent`] is
//! the same change stamped with its stage and time, published on the event
//! bus. [`UiUpdate`] is the coarser "please refresh" signal that screens
//! listen for.

use crate::stage::SyncStage;
use crate::todo::Todo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of mutation applied to the list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// A todo was appended
    Add,
    /// A todo was removed
    Delete,
    /// A todo was replaced in place
    Update,
}

impl Operation {
    /// Lowercase label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single applied mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoChange {
    /// What happened
    pub operation: Operation,
    /// The todo that was added, removed, or written
    pub todo: Todo,
    /// Number of todos after the change
    pub total: usize,
}

impl TodoChange {
    /// Creates a change description
    #[must_use]
    pub const fn new(operation: Operation, todo: Todo, total: usize) -> Self {
        Self {
            operation,
            todo,
            total,
        }
    }
}

/// A change published on the event bus
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEvent {
    /// Stage whose service produced the change
    pub stage: SyncStage,
    /// The change itself
    pub change: TodoChange,
    /// When the change was applied
    pub occurred_at: DateTime<Utc>,
}

/// Request for screens to refresh
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiUpdate {
    /// Stage that asked for the refresh
    pub stage: SyncStage,
    /// Operation that triggered it
    pub operation: Operation,
    /// Number of todos at the time of the request
    pub count: usize,
    /// Badge value at the time of the request
    pub badge_count: usize,
    /// When the request was made
    pub timestamp: DateTime<Utc>,
}
