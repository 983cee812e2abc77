//! Dependency injection traits.
//!
//! Anything a data service would otherwise reach for globally (time, id
//! generation) is abstracted behind a trait and injected through
//! [`ServiceEnvironment`], so tests can substitute deterministic versions.

use crate::todo::TodoId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```ignore
/// // Production - uses system clock
/// struct SystemClock;
/// impl Clock for SystemClock {
///     fn now(&self) -> DateTime<Utc> {
///         Utc::now()
///     }
/// }
///
/// // Test - fixed time for deterministic tests
/// struct FixedClock { time: DateTime<Utc> }
/// impl Clock for FixedClock {
///     fn now(&self) -> DateTime<Utc> {
///         self.time
///     }
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of fresh todo identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce an identifier never handed out before
    fn next_id(&self) -> TodoId;
}

/// Random UUID v4 identifiers
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> TodoId {
        TodoId::random()
    }
}

/// Injected dependencies shared by every data service
#[derive(Clone)]
pub struct ServiceEnvironment {
    /// Clock for event and statistics timestamps
    pub clock: Arc<dyn Clock>,
    /// Generator for new todo identifiers
    pub ids: Arc<dyn IdGenerator>,
}

impl ServiceEnvironment {
    /// Creates an environment from explicit dependencies
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Production environment: wall clock and random UUIDs
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidGenerator))
    }
}

impl Default for ServiceEnvironment {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for ServiceEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEnvironment").finish_non_exhaustive()
    }
}
