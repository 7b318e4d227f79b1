//! Region partitioner.
//!
//! Splits the combined per-state table into one [`RegionSeries`] per region and
//! adds the pre-aggregated nationwide series under [`NATIONWIDE`].

use std::collections::BTreeMap;

use log::{debug, info};

use crate::domain::{DateOrder, NATIONWIDE, RawRecord, RegionId, RegionSeries};
use crate::error::{AppError, ErrorKind};

/// One row of the combined table: a raw record tagged with its region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRow {
    pub region: RegionId,
    pub record: RawRecord,
}

/// Region → series, iterated in region-id order.
pub type RegionMap = BTreeMap<RegionId, RegionSeries>;

/// Partition every region present in `rows`.
///
/// Rows keep their relative order from the combined table. Each series is
/// validated against `order` (unique dates, consistent direction).
pub fn partition(
    rows: Vec<RegionRow>,
    nationwide: Vec<RawRecord>,
    order: DateOrder,
) -> Result<RegionMap, AppError> {
    let grouped = group_rows(rows)?;
    build_map(grouped, nationwide, order)
}

/// Like [`partition`], but every region in `expected` must have at least one row.
pub fn partition_regions(
    rows: Vec<RegionRow>,
    nationwide: Vec<RawRecord>,
    expected: &[RegionId],
    order: DateOrder,
) -> Result<RegionMap, AppError> {
    let grouped = group_rows(rows)?;
    for region in expected {
        if region != NATIONWIDE && !grouped.contains_key(region) {
            return Err(AppError::new(
                ErrorKind::MalformedInput,
                "Region is referenced but has no rows.",
            )
            .with_region(region.clone()));
        }
    }
    build_map(grouped, nationwide, order)
}

fn group_rows(rows: Vec<RegionRow>) -> Result<BTreeMap<RegionId, Vec<RawRecord>>, AppError> {
    let mut grouped: BTreeMap<RegionId, Vec<RawRecord>> = BTreeMap::new();
    for row in rows {
        let region = row.region.trim();
        if region.is_empty() {
            return Err(AppError::new(
                ErrorKind::MalformedInput,
                format!("Row dated {} has an empty region id.", row.record.date),
            )
            .with_field("state"));
        }
        if region == NATIONWIDE {
            return Err(AppError::new(
                ErrorKind::MalformedInput,
                "Combined table uses the reserved nationwide key.",
            )
            .with_region(region));
        }
        grouped.entry(region.to_string()).or_default().push(row.record);
    }
    Ok(grouped)
}

fn build_map(
    grouped: BTreeMap<RegionId, Vec<RawRecord>>,
    nationwide: Vec<RawRecord>,
    order: DateOrder,
) -> Result<RegionMap, AppError> {
    let mut map = RegionMap::new();
    for (region, records) in grouped {
        debug!("partitioned {region}: {} rows", records.len());
        let series = RegionSeries::new(region.clone(), order, records)?;
        map.insert(region, series);
    }

    map.insert(
        NATIONWIDE.to_string(),
        RegionSeries::new(NATIONWIDE, order, nationwide)?,
    );

    info!(
        "partitioned {} regions (including {NATIONWIDE}), {} order",
        map.len(),
        order.label()
    );
    Ok(map)
}
