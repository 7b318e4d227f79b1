//! Shared pipeline logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load rows -> partition by region -> enrich each region -> (optionally) re-window
//!
//! Front-ends (notebooks, renderers, ad-hoc binaries) can then focus on presentation.

use log::info;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::domain::{PopulationTable, RegionSeries, Window};
use crate::error::AppError;
use crate::io::RawDataSource;
use crate::metrics::{apply_window, enrich_region, window_population};
use crate::partition::{RegionMap, partition};

/// All enriched regions of one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub regions: RegionMap,
    pub window: Window,
    #[serde(skip)]
    parallel: bool,
}

impl PipelineOutput {
    pub fn region(&self, region: &str) -> Option<&RegionSeries> {
        self.regions.get(region)
    }

    /// Recompute the rolling columns of every region at `window`.
    ///
    /// Deltas, peaks and per-capita fields are not recomputed. Every region is
    /// checked before any is rewritten, so on error the output is unchanged.
    pub fn rewindow(
        &mut self,
        window: Window,
        populations: &PopulationTable,
    ) -> Result<(), AppError> {
        for series in self.regions.values() {
            window_population(series, populations)?;
        }

        info!("re-windowing {} regions: {} -> {window}", self.regions.len(), self.window);
        for_each_region(&mut self.regions, self.parallel, |series| {
            apply_window(series, populations, window)
        })?;
        self.window = window;
        Ok(())
    }
}

/// Execute the full pipeline and return the enriched regions.
pub fn run<S>(
    source: &S,
    populations: &PopulationTable,
    config: &PipelineConfig,
) -> Result<PipelineOutput, AppError>
where
    S: RawDataSource + ?Sized,
{
    // 1) Load inputs.
    let rows = source.combined_table()?;
    let nationwide = source.nationwide_series()?;

    // 2) One series per region.
    let mut regions = partition(rows, nationwide, config.order)?;

    // 3) Derive every column for every region.
    enrich_all(&mut regions, populations, config.window, config.parallel)?;

    info!(
        "enriched {} regions at window {} ({})",
        regions.len(),
        config.window,
        if config.parallel { "parallel" } else { "sequential" }
    );

    Ok(PipelineOutput {
        regions,
        window: config.window,
        parallel: config.parallel,
    })
}

/// Enrich every region; the first failure aborts the run.
pub fn enrich_all(
    regions: &mut RegionMap,
    populations: &PopulationTable,
    window: Window,
    parallel: bool,
) -> Result<(), AppError> {
    for_each_region(regions, parallel, |series| {
        enrich_region(series, populations, window)
    })
}

fn for_each_region<F>(regions: &mut RegionMap, parallel: bool, f: F) -> Result<(), AppError>
where
    F: Fn(&mut RegionSeries) -> Result<(), AppError> + Sync + Send,
{
    if parallel {
        regions.par_iter_mut().try_for_each(|(_, series)| f(series))
    } else {
        regions.values_mut().try_for_each(f)
    }
}
