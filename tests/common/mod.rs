//! Shared helpers for integration tests.
//!
//! [`RecordingReporter`] keeps every outcome the pipeline reports so tests
//! can wait for and assert on them.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use csvwatch_core::report::{Failure, Reporter};
use csvwatch_core::ImportResult;
use parking_lot::Mutex;

/// Reporter that records imports and failures in memory.
#[derive(Default)]
pub struct RecordingReporter {
    pub imported: Mutex<Vec<ImportResult>>,
    pub failures: Mutex<Vec<String>>,
}

impl Reporter for RecordingReporter {
    fn imported(&self, result: &ImportResult) {
        self.imported.lock().push(result.clone());
    }

    fn failed(&self, failure: &Failure) {
        self.failures.lock().push(failure.to_string());
    }
}

impl RecordingReporter {
    pub fn imported_count(&self) -> usize {
        self.imported.lock().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().len()
    }

    /// Wait until `pred` holds, polling every 20ms, for at most `timeout`.
    pub async fn wait_until(&self, timeout: Duration, pred: impl Fn(&Self) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if pred(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        pred(self)
    }
}

/// Write `content` to `dir/name`.
pub fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("failed to write fixture");
}
