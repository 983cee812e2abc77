//! Todo stages demo binary
//!
//! Runs one scripted session against the stage selected by
//! `TODO_SYNC_STAGE` (default `stage7`).
//!
//! ```bash
//! TODO_SYNC_STAGE=broadcast cargo run -p todo-stages
//! ```

use std::time::Duration;
use todo_stages::Session;
use todo_sync_runtime::metrics::MetricsRecorder;
use todo_sync_runtime::{ContainerConfig, ServiceContainer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_stages=info,todo_sync_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut metrics = MetricsRecorder::new();
    metrics.install()?;

    let config = ContainerConfig::from_env()?;
    let settle = config.ui_debounce * 2 + Duration::from_millis(20);
    let container = ServiceContainer::builder(config).build()?;

    println!("{}\n", container.describe());

    let mut session = Session::new(container);
    for line in session.run_script(settle).await {
        println!("{line}\n");
    }

    if let Some(rendered) = metrics.render() {
        println!("--- metrics ---\n{rendered}");
    }

    session.shutdown();
    Ok(())
}
