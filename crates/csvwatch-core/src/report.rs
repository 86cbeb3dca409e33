//! Reporting interface for import outcomes and caught failures.
//!
//! Nothing in the pipeline drops an error on the floor: the poller hands
//! listing failures to a [`Reporter`], the importer hands it per-file
//! outcomes, and the bus hands it subscriber failures.

use crate::error::{ImportError, WatchError};
use crate::types::ImportResult;

/// A failure caught somewhere in the pipeline.
#[derive(Debug)]
pub enum Failure {
    /// A poll cycle could not list the watched directory.
    Listing(WatchError),
    /// A single file could not be imported.
    Import(ImportError),
    /// A bus subscriber returned an error or panicked.
    Handler {
        /// Name the subscriber registered with.
        subscriber: String,
        /// What went wrong.
        message: String,
    },
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Listing(e) => write!(f, "{e}"),
            Failure::Import(e) => write!(f, "{e}"),
            Failure::Handler {
                subscriber,
                message,
            } => write!(f, "Subscriber '{subscriber}' failed: {message}"),
        }
    }
}

/// Sink for import outcomes.
pub trait Reporter: Send + Sync {
    /// A file was imported successfully.
    fn imported(&self, result: &ImportResult);

    /// Something failed and was contained.
    fn failed(&self, failure: &Failure);
}

/// Reporter that writes everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn imported(&self, result: &ImportResult) {
        tracing::info!(
            file = %result.source.display(),
            records = result.len(),
            "File imported"
        );
        match result.to_json() {
            Ok(json) => tracing::debug!(file = %result.source.display(), "{json}"),
            Err(e) => tracing::warn!("Failed to render records as JSON: {e}"),
        }
    }

    fn failed(&self, failure: &Failure) {
        match failure {
            Failure::Listing(e) => tracing::error!(error = %e, "Poll cycle failed"),
            Failure::Import(e) => {
                tracing::warn!(file = %e.path().display(), error = %e, "Import failed")
            }
            Failure::Handler { subscriber, .. } => {
                tracing::error!(subscriber = %subscriber, "{failure}")
            }
        }
    }
}
