//! Reporting utilities: per-capita scaling and text summaries.

pub mod format;

pub use format::*;
