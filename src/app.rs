//! Top-level application orchestration.
//!
//! There is no binary; embedders call [`run_from_dir`] (or `pipeline::run` with
//! their own sources). This module is the "real main" that:
//! - reads configuration from the environment
//! - loads the daily exports and the population table
//! - runs partitioning and enrichment

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::io::{CsvSource, PopulationSource};

pub mod pipeline;

pub use pipeline::{PipelineOutput, enrich_all, run};

/// Run the pipeline over the CSV exports in `dir`, configured from the environment.
pub fn run_from_dir(dir: &Path) -> Result<PipelineOutput, AppError> {
    let config = PipelineConfig::from_env()?;
    run_from_dir_with(dir, &config)
}

/// Run the pipeline over the CSV exports in `dir` with an explicit config.
pub fn run_from_dir_with(dir: &Path, config: &PipelineConfig) -> Result<PipelineOutput, AppError> {
    let source = CsvSource::new(dir);
    let populations = source.population_table()?;
    pipeline::run(&source, &populations, config)
}
