//! Stage catalogue: which propagation technique is active and what it can do.
//!
//! Every stage implements the same CRUD contract. They differ in how changes
//! reach consumers, and that difference is described here so the container
//! and the view models can make decisions without knowing concrete types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// How far a stage propagates changes on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCapability {
    /// No propagation at all
    None,
    /// Consumers must re-fetch on their own
    Manual,
    /// Changes are pushed through the event bus
    Automatic,
    /// Changes flow through reactive subjects
    Reactive,
}

impl std::fmt::Display for SyncCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Manual => write!(f, "manual"),
            Self::Automatic => write!(f, "automatic"),
            Self::Reactive => write!(f, "reactive"),
        }
    }
}

/// One of the eight parallel implementations of the feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    /// Direct property access, no notifications
    Stage1,
    /// Delegate registry
    Stage2,
    /// Single stored closure
    Stage3,
    /// Typed broadcast bus
    Stage4,
    /// Shared instance plus broadcast
    Stage5,
    /// Persisted write-through cache plus broadcast
    Stage6,
    /// Reactive subjects
    Stage7,
    /// Persistence plus MVVM (planned, no data service yet)
    Stage8,
}

/// Error returned when a stage name cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown stage: {0}")]
pub struct ParseStageError(pub String);

impl SyncStage {
    /// All stages in order
    pub const ALL: [Self; 8] = [
        Self::Stage1,
        Self::Stage2,
        Self::Stage3,
        Self::Stage4,
        Self::Stage5,
        Self::Stage6,
        Self::Stage7,
        Self::Stage8,
    ];

    /// Stage number, 1 through 8
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Stage1 => 1,
            Self::Stage2 => 2,
            Self::Stage3 => 3,
            Self::Stage4 => 4,
            Self::Stage5 => 5,
            Self::Stage6 => 6,
            Self::Stage7 => 7,
            Self::Stage8 => 8,
        }
    }

    /// Short display name such as `Stage4`
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Stage1 => "Stage1",
            Self::Stage2 => "Stage2",
            Self::Stage3 => "Stage3",
            Self::Stage4 => "Stage4",
            Self::Stage5 => "Stage5",
            Self::Stage6 => "Stage6",
            Self::Stage7 => "Stage7",
            Self::Stage8 => "Stage8",
        }
    }

    /// Name of the propagation technique, also accepted by [`FromStr`]
    #[must_use]
    pub const fn technique(self) -> &'static str {
        match self {
            Self::Stage1 => "property",
            Self::Stage2 => "delegate",
            Self::Stage3 => "closure",
            Self::Stage4 => "broadcast",
            Self::Stage5 => "shared",
            Self::Stage6 => "persisted",
            Self::Stage7 => "reactive",
            Self::Stage8 => "persisted-mvvm",
        }
    }

    /// Human readable title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Stage1 => "Direct property passing",
            Self::Stage2 => "Delegate registry",
            Self::Stage3 => "Closure callback",
            Self::Stage4 => "Broadcast event bus",
            Self::Stage5 => "Shared global state",
            Self::Stage6 => "Persisted write-through cache",
            Self::Stage7 => "Reactive subjects",
            Self::Stage8 => "Persistence + MVVM",
        }
    }

    /// Relative complexity on a 1-5 scale
    #[must_use]
    pub const fn complexity(self) -> u8 {
        match self {
            Self::Stage1 => 1,
            Self::Stage2 | Self::Stage3 | Self::Stage6 => 2,
            Self::Stage4 | Self::Stage5 => 3,
            Self::Stage7 => 4,
            Self::Stage8 => 5,
        }
    }

    /// Whether the list badge reacts to additions in this stage
    #[must_use]
    pub const fn badge_supported(self) -> bool {
        !matches!(self, Self::Stage1 | Self::Stage2 | Self::Stage3)
    }

    /// How this stage propagates changes
    #[must_use]
    pub const fn sync_capability(self) -> SyncCapability {
        match self {
            Self::Stage1 | Self::Stage2 | Self::Stage3 => SyncCapability::Manual,
            Self::Stage4 | Self::Stage5 | Self::Stage6 => SyncCapability::Automatic,
            Self::Stage7 | Self::Stage8 => SyncCapability::Reactive,
        }
    }

    /// Whether a data service exists for this stage
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        !matches!(self, Self::Stage8)
    }

    /// One-line summary, e.g. `Stage4: Broadcast event bus (3/5)`
    #[must_use]
    pub fn full_description(self) -> String {
        format!(
            "{}: {} ({}/5)",
            self.display_name(),
            self.title(),
            self.complexity()
        )
    }

    /// What to look for when running this stage
    #[must_use]
    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Stage1 => {
                "Data is read directly from the service. New todos only appear after the \
                 list is shown again, and the badge stays at 0."
            }
            Self::Stage2 => {
                "Registered observers hear about every change, but nothing forwards it \
                 to the screens. The badge stays at 0."
            }
            Self::Stage3 => {
                "A single stored callback is invoked on every change. Binding a second \
                 consumer replaces the first. The badge stays at 0."
            }
            Self::Stage4 => {
                "Changes are published on a typed event bus and re-published as UI \
                 updates. The badge counts additions until the list is viewed."
            }
            Self::Stage5 => {
                "One shared instance owns the list for the whole process and keeps \
                 access statistics. The badge behaves as in stage 4."
            }
            Self::Stage6 => {
                "Every change is written through to local storage. The list, its ids \
                 and the badge survive a restart."
            }
            Self::Stage7 => {
                "State and operations flow through reactive subjects. The badge is \
                 derived from add operations and UI updates are debounced."
            }
            Self::Stage8 => "Planned: persistent store combined with MVVM bindings.",
        }
    }
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SyncStage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let digits = normalized.strip_prefix("stage").unwrap_or(&normalized);

        if let Ok(number) = digits.parse::<u8>() {
            return Self::ALL
                .into_iter()
                .find(|stage| stage.number() == number)
                .ok_or_else(|| ParseStageError(s.to_string()));
        }

        Self::ALL
            .into_iter()
            .find(|stage| stage.technique() == normalized)
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}
