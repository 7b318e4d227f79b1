//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw cumulative inputs (`RawRecord`) and their storage direction (`DateOrder`)
//! - the per-region series the engine enriches in place (`RegionSeries`, `DailyRecord`)
//! - derived sections (`DailyMetrics`, `SeriesPeak`, `PerCapita`, `RollingMetrics`)
//! - lookups and knobs (`PopulationTable`, `Window`)

pub mod types;

pub use types::*;
