//! Error taxonomy for the csvwatch pipeline.
//!
//! Per-file failures are [`ImportError`]s and per-cycle failures are
//! [`WatchError`]s. Neither is fatal to a running watch: both are handed to a
//! [`Reporter`](crate::report::Reporter) and the pipeline carries on. The
//! unified [`Error`] is what bus subscribers return.

use std::path::PathBuf;

/// A failure to convert a single file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The file does not carry the exact `.csv` extension.
    #[error("Unsupported format: cannot import {}, only '.csv' is supported", .path.display())]
    UnsupportedFormat {
        /// The rejected path.
        path: PathBuf,
    },

    /// The file vanished or became unreadable between detection and import.
    #[error("Read error [{}]: {source}", .path.display())]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not well-formed CSV.
    #[error("Parse error [{}] at row {row}: {message}", .path.display())]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// Zero-based record index; the header is row 0.
        row: u64,
        /// Human-readable description of the problem.
        message: String,
    },
}

impl ImportError {
    /// The file this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ImportError::UnsupportedFormat { path }
            | ImportError::Read { path, .. }
            | ImportError::Parse { path, .. } => path,
        }
    }

    /// Convenience constructor for [`ImportError::Parse`].
    pub fn parse(path: impl Into<PathBuf>, row: u64, message: impl Into<String>) -> Self {
        ImportError::Parse {
            path: path.into(),
            row,
            message: message.into(),
        }
    }
}

/// A failure of the watch itself.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The watched directory could not be listed this cycle.
    #[error("Listing error [{}]: {source}", .dir.display())]
    Listing {
        /// The directory that failed to list.
        dir: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The watch target was rejected before the loop started.
    #[error("Invalid watch target: {0}")]
    InvalidTarget(String),
}

/// Unified error type covering all failure modes in csvwatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// The watch could not list or could not start.
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// A bus subscriber failed to handle an event.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl Error {
    /// Convenience constructor for [`Error::Handler`].
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
