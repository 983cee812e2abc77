//! Prometheus metrics for the data services.
//!
//! Services record through the `metrics` facade; without an installed
//! recorder every call is a no-op. A process that wants the numbers installs
//! one with [`MetricsRecorder::install`] and renders it in Prometheus text
//! format.
//!
//! # Example
//!
//! ```rust,no_run
//! use todo_sync_runtime::metrics::MetricsRecorder;
//!
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//! // ... use a data service ...
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok::<(), todo_sync_runtime::metrics::MetricsError>(())
//! ```

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use todo_sync_core::{Operation, SyncStage};

/// Applied mutations, labelled by `stage` and `operation`
pub const MUTATIONS_TOTAL: &str = "todo_sync_mutations_total";
/// Badge resets, labelled by `stage`
pub const BADGE_CLEARED_TOTAL: &str = "todo_sync_badge_cleared_total";
/// UI updates published on the bus, labelled by `stage`
pub const UI_UPDATES_TOTAL: &str = "todo_sync_ui_updates_total";
/// Failed storage writes, labelled by `stage`
pub const STORAGE_WRITE_ERRORS_TOTAL: &str = "todo_sync_storage_write_errors_total";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install the Prometheus recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Owner of an installed Prometheus recorder
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that is not yet installed
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe every metric and install the recorder globally.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if installation fails for any reason
    /// other than a recorder already being present.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                register_metrics();
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this recorder was not the one installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(MUTATIONS_TOTAL, "Total number of applied todo mutations");
    describe_counter!(BADGE_CLEARED_TOTAL, "Total number of badge resets");
    describe_counter!(UI_UPDATES_TOTAL, "Total number of UI updates published on the bus");
    describe_counter!(
        STORAGE_WRITE_ERRORS_TOTAL,
        "Total number of failed storage writes"
    );
}

/// Count one applied mutation
pub fn record_mutation(stage: SyncStage, operation: Operation) {
    counter!(
        MUTATIONS_TOTAL,
        "stage" => stage.display_name(),
        "operation" => operation.as_str()
    )
    .increment(1);
}

/// Count one badge reset
pub fn record_badge_cleared(stage: SyncStage) {
    counter!(BADGE_CLEARED_TOTAL, "stage" => stage.display_name()).increment(1);
}

/// Count one UI update
pub fn record_ui_update(stage: SyncStage) {
    counter!(UI_UPDATES_TOTAL, "stage" => stage.display_name()).increment(1);
}

/// Count one failed storage write
pub fn record_storage_write_error(stage: SyncStage) {
    counter!(STORAGE_WRITE_ERRORS_TOTAL, "stage" => stage.display_name()).increment(1);
}
