//! Derived-metrics engine.
//!
//! Responsibilities, in dependency order:
//!
//! - deltas and rates from cumulative counts (`deltas`)
//! - peak of daily new cases (`peak`)
//! - per-capita normalization (`per_capita`)
//! - rolling averages at a chosen window (`rolling`)
//!
//! Each step is a pure function of one region's series and its population.
//! Regions never share state, so callers may process them in any order.

pub mod deltas;
pub mod peak;
pub mod per_capita;
pub mod rolling;

use std::num::NonZeroU64;

use log::debug;

use crate::domain::{PopulationTable, RegionSeries, Window};
use crate::error::{AppError, ErrorKind};

/// Run every step on one region, in place.
///
/// The population is looked up before anything is written, so an unknown
/// region leaves the series untouched.
pub fn enrich_region(
    series: &mut RegionSeries,
    populations: &PopulationTable,
    window: Window,
) -> Result<(), AppError> {
    let population = populations.get(series.region())?;

    deltas::compute(series);
    let peak = peak::detect(series);
    per_capita::normalize(series, population);
    rolling::smooth(series, window, population);

    debug!(
        "enriched {}: {} records, peak {:?} on {:?}",
        series.region(),
        series.len(),
        peak.peak_rate,
        peak.peak_date
    );
    Ok(())
}

/// Recompute only the rolling averages at a new window size.
///
/// Deltas, peak and per-capita fields are reused as they are.
pub fn apply_window(
    series: &mut RegionSeries,
    populations: &PopulationTable,
    window: Window,
) -> Result<(), AppError> {
    let population = window_population(series, populations)?;
    rolling::smooth(series, window, population);
    Ok(())
}

/// Everything [`apply_window`] needs from `series`, checked without writing.
pub fn window_population(
    series: &RegionSeries,
    populations: &PopulationTable,
) -> Result<NonZeroU64, AppError> {
    if !series.has_daily_metrics() {
        return Err(AppError::new(
            ErrorKind::Config,
            "Rolling averages requested before daily metrics were derived.",
        )
        .with_region(series.region()));
    }
    populations.get(series.region())
}
