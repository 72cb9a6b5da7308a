//! COVID tracker library
//!
//! Loads daily confirmed, deaths and recovered counts per country, caching
//! each day's download on disk. Exposed as a library for the binary and for
//! integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod loader;
pub mod progress;
pub mod stats;
pub mod ui;

pub use loader::{CancelFlag, LoadError, LoadHandle, LoadReport, LoadSource, MeasurementLoader};
