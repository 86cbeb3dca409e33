//! csvwatch - poll a directory and import every new CSV file exactly once.
//!
//! This library crate exposes the pipeline for integration testing.

pub mod app;
pub mod config;
pub mod import;
pub mod watch;
