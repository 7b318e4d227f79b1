//! Input collaborators.
//!
//! The engine only sees the two traits below. `ingest` provides the CSV-backed
//! implementation (`CsvSource`) for the daily state/national exports and the
//! state population table; `InMemorySource` serves rows that are already
//! loaded.

pub mod ingest;

pub use ingest::*;

use crate::domain::{PopulationTable, RawRecord};
use crate::error::AppError;
use crate::partition::RegionRow;

/// Supplies the raw cumulative counts.
pub trait RawDataSource {
    /// Combined per-region table, in its stored row order.
    fn combined_table(&self) -> Result<Vec<RegionRow>, AppError>;

    /// Pre-aggregated nationwide series.
    fn nationwide_series(&self) -> Result<Vec<RawRecord>, AppError>;
}

/// Supplies region populations.
pub trait PopulationSource {
    fn population_table(&self) -> Result<PopulationTable, AppError>;
}

impl PopulationSource for PopulationTable {
    fn population_table(&self) -> Result<PopulationTable, AppError> {
        Ok(self.clone())
    }
}

/// Rows already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub rows: Vec<RegionRow>,
    pub nationwide: Vec<RawRecord>,
}

impl InMemorySource {
    pub fn new(rows: Vec<RegionRow>, nationwide: Vec<RawRecord>) -> Self {
        Self { rows, nationwide }
    }
}

impl RawDataSource for InMemorySource {
    fn combined_table(&self) -> Result<Vec<RegionRow>, AppError> {
        Ok(self.rows.clone())
    }

    fn nationwide_series(&self) -> Result<Vec<RawRecord>, AppError> {
        Ok(self.nationwide.clone())
    }
}
