//! csvwatch-core: shared types, errors, reporting and the notification bus.
//!
//! This crate is the foundational dependency of the `csvwatch` pipeline. It
//! defines the error taxonomy, the [`events::ChangeEvent`] that flows from
//! the poller to its subscribers, the in-process [`events::NotificationBus`]
//! that carries it, the result of a CSV import, and the [`report::Reporter`]
//! interface every caught failure is routed through.

pub mod error;
pub mod events;
pub mod report;
pub mod types;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, ImportError, Result, WatchError};
pub use events::{ChangeEvent, ChangeHandler, NotificationBus};
pub use report::{Failure, Reporter, TracingReporter};
pub use types::{ImportResult, Record};
