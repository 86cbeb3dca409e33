//! Wires the poller, the notification bus and the importer together.

use crate::config::Config;
use crate::import::Importer;
use crate::watch::{start_watching, WatchSummary};
use anyhow::{Context, Result};
use csvwatch_core::events::{spawn_handler, NotificationBus};
use csvwatch_core::report::{Reporter, TracingReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long queued imports may keep running after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Run the watch pipeline with the default [`TracingReporter`] until
/// `cancel` fires.
pub async fn run(config: Config, cancel: CancellationToken) -> Result<WatchSummary> {
    run_with_reporter(config, Arc::new(TracingReporter), cancel).await
}

/// Run the watch pipeline, sending every outcome to `reporter`.
///
/// Fails only if the pipeline cannot be started. Once running, listing and
/// import failures go to `reporter` and the loop carries on until `cancel`
/// fires. Imports already queued are then given [`SHUTDOWN_GRACE`] to
/// finish.
pub async fn run_with_reporter(
    config: Config,
    reporter: Arc<dyn Reporter>,
    cancel: CancellationToken,
) -> Result<WatchSummary> {
    let target = config.watch_target()?;
    let importer = Importer::new(target.dir(), reporter.clone())
        .with_context(|| format!("Failed to resolve watch path: {:?}", target.dir()))?;

    tracing::info!("Starting {}", config.name);

    let bus = Arc::new(NotificationBus::new());
    let abort = CancellationToken::new();
    let importer_task = spawn_handler(&bus, Arc::new(importer), reporter.clone(), abort.clone());
    let poller = start_watching(target, bus.clone(), reporter, cancel);

    let summary = poller.await.context("File watcher task failed")?;

    // Let the importer drain whatever the last cycles queued.
    bus.unsubscribe(importer_task.id());
    let deadline = {
        let abort = abort.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SHUTDOWN_GRACE).await;
            tracing::warn!("Pending imports did not finish in time, abandoning them");
            abort.cancel();
        })
    };
    let handled = importer_task.join().await;
    deadline.abort();

    tracing::info!(files = handled, "Importer stopped");
    Ok(summary)
}
