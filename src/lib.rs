//! `epi-indicators` library crate.
//!
//! Derives daily epidemiological indicators (deltas, test positivity, growth
//! factors, per-capita rates, rolling averages, peaks) from cumulative counts
//! reported per region per day.
//!
//! Layout:
//!
//! - `partition`: combined table -> one ordered series per region
//! - `metrics`: the derived-metrics engine, one region at a time
//! - `io`: input collaborators (traits + CSV implementation)
//! - `app`: end-to-end orchestration

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod partition;
pub mod report;

pub use error::{AppError, ErrorKind};
