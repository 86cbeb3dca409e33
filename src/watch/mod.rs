pub mod tracker;

pub use tracker::ChangeTracker;

use csvwatch_core::events::{ChangeEvent, NotificationBus};
use csvwatch_core::report::{Failure, Reporter};
use csvwatch_core::WatchError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Directory to poll and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    dir: PathBuf,
    interval: Duration,
}

impl WatchTarget {
    pub fn new(dir: impl Into<PathBuf>, interval: Duration) -> Result<Self, WatchError> {
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return Err(WatchError::InvalidTarget("watch path is empty".into()));
        }
        if interval.is_zero() {
            return Err(WatchError::InvalidTarget(
                "poll interval must be positive".into(),
            ));
        }
        Ok(Self { dir, interval })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Counters accumulated over the lifetime of a poll loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    pub cycles: u64,
    pub events_emitted: u64,
    pub failed_cycles: u64,
}

/// Periodically lists a directory and publishes a [`ChangeEvent`] for every
/// file name it has not reported before.
pub struct Poller {
    target: WatchTarget,
    tracker: ChangeTracker,
    bus: Arc<NotificationBus>,
    reporter: Arc<dyn Reporter>,
    summary: WatchSummary,
}

impl Poller {
    pub fn new(target: WatchTarget, bus: Arc<NotificationBus>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            target,
            tracker: ChangeTracker::new(),
            bus,
            reporter,
            summary: WatchSummary::default(),
        }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn summary(&self) -> WatchSummary {
        self.summary
    }

    /// Run a single poll cycle and return how many events were published.
    ///
    /// The listing is collected in full before anything is published, so a
    /// failed listing publishes nothing and marks nothing as seen.
    pub async fn poll_once(&mut self) -> Result<usize, WatchError> {
        self.summary.cycles += 1;

        let names = match list_files(&self.target.dir).await {
            Ok(names) => names,
            Err(e) => {
                self.summary.failed_cycles += 1;
                return Err(e);
            }
        };

        let mut emitted = 0;
        for name in names {
            if self.tracker.has_seen(&name) {
                continue;
            }
            tracing::debug!(file = %name, "New file detected");
            self.bus.publish(ChangeEvent::new(name.clone()));
            self.tracker.mark_seen(name);
            emitted += 1;
        }

        self.summary.events_emitted += emitted as u64;
        Ok(emitted)
    }

    /// Poll until `cancel` fires.
    ///
    /// The first cycle runs immediately. Cycles never overlap: a cycle that
    /// overruns the interval delays the next one. Listing failures are
    /// reported and retried on the next tick.
    pub async fn run(mut self, cancel: CancellationToken) -> WatchSummary {
        tracing::info!(
            dir = %self.target.dir.display(),
            interval_ms = self.target.interval.as_millis() as u64,
            "Watching directory"
        );

        let mut ticker = tokio::time::interval(self.target.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if cancel.is_cancelled() {
                break;
            }

            match self.poll_once().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(new_files = n, "Poll cycle complete"),
                Err(e) => self.reporter.failed(&Failure::Listing(e)),
            }
        }

        tracing::info!(
            cycles = self.summary.cycles,
            events = self.summary.events_emitted,
            failed_cycles = self.summary.failed_cycles,
            "File watcher stopped"
        );
        self.summary
    }

    /// Spawn [`Poller::run`] onto the runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<WatchSummary> {
        tokio::spawn(self.run(cancel))
    }
}

/// Start polling `target` on a background task, publishing to `bus`.
pub fn start_watching(
    target: WatchTarget,
    bus: Arc<NotificationBus>,
    reporter: Arc<dyn Reporter>,
    cancel: CancellationToken,
) -> JoinHandle<WatchSummary> {
    Poller::new(target, bus, reporter).spawn(cancel)
}

/// List the non-directory entries of `dir`, in listing order.
async fn list_files(dir: &Path) -> Result<Vec<String>, WatchError> {
    let listing_error = |source| WatchError::Listing {
        dir: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(listing_error)?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
        // Entries that disappear mid-listing are picked up, or not, next cycle.
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::debug!("Skipping {:?}: {}", entry.file_name(), e);
                continue;
            }
        };
        if file_type.is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!("Skipping non UTF-8 file name: {:?}", raw),
        }
    }

    Ok(names)
}
