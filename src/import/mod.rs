//! CSV import: turns a newly detected file into an [`ImportResult`].
//!
//! [`import_file`] is the one-shot conversion. [`Importer`] wraps it as a
//! bus subscriber that resolves each [`ChangeEvent`] against the watched
//! directory and hands every outcome, good or bad, to a [`Reporter`].

mod parse;

pub use parse::parse_records;

use async_trait::async_trait;
use csvwatch_core::events::{ChangeEvent, ChangeHandler};
use csvwatch_core::report::{Failure, Reporter};
use csvwatch_core::{ImportError, ImportResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extension accepted by the importer, compared case-sensitively.
const CSV_EXTENSION: &str = "csv";

/// Check if a path has the exact `.csv` extension.
pub fn is_csv(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CSV_EXTENSION)
}

/// Import a CSV file.
///
/// The extension is checked before the file is touched, so a non-CSV path
/// fails with [`ImportError::UnsupportedFormat`] whether or not it exists.
pub async fn import_file(path: &Path) -> Result<ImportResult, ImportError> {
    ensure_csv(path)?;
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| read_error(path, source))?;
    finish_import(path, &data)
}

/// Blocking variant of [`import_file`] for callers without a runtime.
pub fn import_file_sync(path: &Path) -> Result<ImportResult, ImportError> {
    ensure_csv(path)?;
    let data = std::fs::read(path).map_err(|source| read_error(path, source))?;
    finish_import(path, &data)
}

fn ensure_csv(path: &Path) -> Result<(), ImportError> {
    if is_csv(path) {
        Ok(())
    } else {
        Err(ImportError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

fn read_error(path: &Path, source: std::io::Error) -> ImportError {
    ImportError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn finish_import(path: &Path, data: &[u8]) -> Result<ImportResult, ImportError> {
    let (headers, records) = parse_records(path, data)?;
    Ok(ImportResult::new(path, headers, records))
}

/// Path of the JSON file written next to `csv_path` by [`write_json`].
pub fn json_path_for(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("json")
}

/// Write the records of `result` to `dest` as pretty-printed JSON.
pub fn write_json(result: &ImportResult, dest: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    let json = result.to_json().context("Failed to serialize records")?;
    std::fs::write(dest, json).with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(())
}

/// Bus subscriber that imports every newly detected file.
pub struct Importer {
    watch_dir: PathBuf,
    reporter: Arc<dyn Reporter>,
}

impl Importer {
    /// Create an importer for files that appear in `watch_dir`.
    ///
    /// A relative `watch_dir` is made absolute against the current directory
    /// now, so later changes of the working directory do not move it.
    pub fn new(watch_dir: &Path, reporter: Arc<dyn Reporter>) -> std::io::Result<Self> {
        Ok(Self {
            watch_dir: std::path::absolute(watch_dir)?,
            reporter,
        })
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    /// Full path of a file name reported by the poller.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        self.watch_dir.join(filename)
    }

    /// Import the file behind `event` and report the outcome.
    pub async fn handle(&self, event: &ChangeEvent) -> Option<ImportResult> {
        tracing::info!(file = %event.filename, "New file detected, importing");
        let path = self.resolve(&event.filename);

        match import_file(&path).await {
            Ok(result) => {
                self.reporter.imported(&result);
                Some(result)
            }
            Err(e) => {
                self.reporter.failed(&Failure::Import(e));
                None
            }
        }
    }
}

#[async_trait]
impl ChangeHandler for Importer {
    fn name(&self) -> &str {
        "importer"
    }

    async fn on_change(&self, event: &ChangeEvent) -> csvwatch_core::Result<()> {
        // Per-file failures are reported by `handle` and never reach the bus.
        self.handle(event).await;
        Ok(())
    }
}
