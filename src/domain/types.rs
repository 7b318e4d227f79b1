//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - enriched in place by the metrics engine
//! - handed read-only to a renderer in whatever format it wants
//! - inspected in tests without any I/O

use std::collections::HashMap;
use std::num::NonZeroU64;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};

/// Region identifier (a state code, or [`NATIONWIDE`]).
pub type RegionId = String;

/// Reserved key for the pre-aggregated nationwide series.
pub const NATIONWIDE: &str = "USA";

/// Storage direction of a [`RegionSeries`].
///
/// Every derived column depends on this tag:
///
/// - deltas always compare a record with the previous *calendar* day
/// - peak ties always resolve to the most recent date
/// - rolling windows always trail in *storage* order (see `metrics::rolling`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateOrder {
    /// Descending by date; index 0 is the most recent day.
    #[default]
    NewestFirst,
    /// Ascending by date; index 0 is the oldest day.
    OldestFirst,
}

impl DateOrder {
    /// Storage index of the previous calendar day, if it is stored.
    pub fn prior_index(self, i: usize, len: usize) -> Option<usize> {
        match self {
            DateOrder::NewestFirst => (i + 1 < len).then_some(i + 1),
            DateOrder::OldestFirst => i.checked_sub(1),
        }
    }

    /// Storage indices, most recent first.
    pub fn newest_to_oldest(self, len: usize) -> impl Iterator<Item = usize> {
        (0..len).map(move |k| match self {
            DateOrder::NewestFirst => k,
            DateOrder::OldestFirst => len - 1 - k,
        })
    }

    /// Whether `earlier_in_storage` may be stored directly before `later_in_storage`.
    pub fn precedes(self, earlier_in_storage: NaiveDate, later_in_storage: NaiveDate) -> bool {
        match self {
            DateOrder::NewestFirst => earlier_in_storage > later_in_storage,
            DateOrder::OldestFirst => earlier_in_storage < later_in_storage,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateOrder::NewestFirst => "newest-first",
            DateOrder::OldestFirst => "oldest-first",
        }
    }
}

/// Rolling-average window size (always at least 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Window(usize);

impl Window {
    pub fn new(size: usize) -> Result<Self, AppError> {
        if size == 0 {
            return Err(AppError::new(
                ErrorKind::Config,
                "Rolling window must be at least 1 record.",
            ));
        }
        Ok(Self(size))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Window {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<usize> for Window {
    type Error = AppError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Window::new(value)
    }
}

impl From<Window> for usize {
    fn from(value: Window) -> Self {
        value.0
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cumulative counts reported for one region on one date.
///
/// `None` means the count was not reported that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub positive: Option<u64>,
    pub negative: Option<u64>,
    pub hospitalized_cumulative: Option<u64>,
    pub death: Option<u64>,
    pub recovered: Option<u64>,
}

impl RawRecord {
    /// A record with every count unreported.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            positive: None,
            negative: None,
            hospitalized_cumulative: None,
            death: None,
            recovered: None,
        }
    }
}

/// Day-over-day deltas and rates.
///
/// Deltas are signed: a downward revision of a cumulative count shows up as a
/// negative delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyMetrics {
    pub new_pos: Option<i64>,
    pub new_neg: Option<i64>,
    pub new_tests: Option<i64>,
    pub total_tests: Option<i64>,
    pub new_hosp: Option<i64>,
    pub new_deaths: Option<i64>,
    /// Percent of new tests that were positive (0–100 for consistent data).
    pub daily_pct_pos: Option<f64>,
    /// `positive − death − recovered`; negative when inputs are inconsistent.
    pub active: Option<i64>,
    /// `new_pos / positive`.
    pub daily_growth_factor_a: Option<f64>,
    /// `new_pos / active`.
    pub daily_growth_factor_b: Option<f64>,
}

/// Series-level peak of `new_pos`, broadcast onto every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeriesPeak {
    pub peak_rate: Option<i64>,
    pub peak_date: Option<NaiveDate>,
}

/// Per-capita fractions (value ÷ population, unscaled).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerCapita {
    pub new_pos_pc: Option<f64>,
    pub new_neg_pc: Option<f64>,
    pub new_tests_pc: Option<f64>,
    pub total_tests_pc: Option<f64>,
    pub new_hosp_pc: Option<f64>,
    pub new_deaths_pc: Option<f64>,
}

/// Rolling averages for one window size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingMetrics {
    pub window: Window,
    pub new_cases_rolling: Option<f64>,
    pub new_hosp_rolling: Option<f64>,
    pub new_deaths_rolling: Option<f64>,
    pub daily_pct_pos_rolling: Option<f64>,
    pub new_cases_rolling_pc: Option<f64>,
    pub new_hosp_rolling_pc: Option<f64>,
    pub new_deaths_rolling_pc: Option<f64>,
}

/// A raw record plus the derived sections layered onto it.
///
/// Each section stays `None` until the matching engine step has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub raw: RawRecord,
    pub daily: Option<DailyMetrics>,
    pub peak: Option<SeriesPeak>,
    pub per_capita: Option<PerCapita>,
    pub rolling: Option<RollingMetrics>,
}

impl DailyRecord {
    pub fn new(raw: RawRecord) -> Self {
        Self {
            raw,
            daily: None,
            peak: None,
            per_capita: None,
            rolling: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.raw.date
    }

    pub fn new_pos(&self) -> Option<i64> {
        self.daily.as_ref().and_then(|d| d.new_pos)
    }
}

/// One region's ordered daily records.
///
/// Construction checks that dates are unique and stored in the declared
/// [`DateOrder`]; the records cannot be reordered afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSeries {
    region: RegionId,
    order: DateOrder,
    records: Vec<DailyRecord>,
    peak: Option<SeriesPeak>,
    window: Option<Window>,
}

impl RegionSeries {
    pub fn new(
        region: impl Into<RegionId>,
        order: DateOrder,
        raw: Vec<RawRecord>,
    ) -> Result<Self, AppError> {
        let region = region.into();
        if raw.is_empty() {
            return Err(AppError::new(ErrorKind::MalformedInput, "Region has no rows.")
                .with_region(region));
        }

        for pair in raw.windows(2) {
            let (a, b) = (pair[0].date, pair[1].date);
            if a == b {
                return Err(AppError::new(
                    ErrorKind::MalformedInput,
                    format!("Duplicate date {a}."),
                )
                .with_region(region)
                .with_field("date"));
            }
            if !order.precedes(a, b) {
                return Err(AppError::new(
                    ErrorKind::MalformedInput,
                    format!("Date {b} is out of order after {a} (expected {}).", order.label()),
                )
                .with_region(region)
                .with_field("date"));
            }
        }

        Ok(Self {
            region,
            order,
            records: raw.into_iter().map(DailyRecord::new).collect(),
            peak: None,
            window: None,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn order(&self) -> DateOrder {
        self.order
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    /// Engine access; raw dates must not be touched through this.
    pub(crate) fn records_mut(&mut self) -> &mut [DailyRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn peak(&self) -> Option<SeriesPeak> {
        self.peak
    }

    pub(crate) fn set_peak(&mut self, peak: SeriesPeak) {
        self.peak = Some(peak);
    }

    /// Window of the rolling columns currently stored, if any.
    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub(crate) fn set_window(&mut self, window: Window) {
        self.window = Some(window);
    }

    /// Whether the deltas and rates have been derived.
    pub fn has_daily_metrics(&self) -> bool {
        self.records.iter().all(|r| r.daily.is_some())
    }

    /// The most recent record.
    pub fn latest(&self) -> Option<&DailyRecord> {
        self.order
            .newest_to_oldest(self.records.len())
            .next()
            .map(|i| &self.records[i])
    }
}

/// Region → population count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTable {
    entries: HashMap<RegionId, NonZeroU64>,
}

impl PopulationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(region, population)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<RegionId>,
    {
        let mut table = Self::new();
        for (region, population) in entries {
            table.insert(region, population)?;
        }
        Ok(table)
    }

    /// Add one region. Zero populations and duplicate regions are rejected.
    pub fn insert(&mut self, region: impl Into<RegionId>, population: u64) -> Result<(), AppError> {
        let region = region.into();
        let Some(population) = NonZeroU64::new(population) else {
            return Err(AppError::new(ErrorKind::MalformedInput, "Population must be positive.")
                .with_region(region)
                .with_field("population"));
        };
        if self.entries.contains_key(&region) {
            return Err(AppError::new(ErrorKind::MalformedInput, "Duplicate population entry.")
                .with_region(region)
                .with_field("population"));
        }
        self.entries.insert(region, population);
        Ok(())
    }

    /// Population of `region`; unknown regions are a hard error.
    pub fn get(&self, region: &str) -> Result<NonZeroU64, AppError> {
        self.entries.get(region).copied().ok_or_else(|| {
            AppError::new(ErrorKind::Lookup, "No population entry for region.")
                .with_region(region)
                .with_field("population")
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    #[test]
    fn prior_index_follows_calendar_direction() {
        assert_eq!(DateOrder::NewestFirst.prior_index(0, 3), Some(1));
        assert_eq!(DateOrder::NewestFirst.prior_index(2, 3), None);
        assert_eq!(DateOrder::OldestFirst.prior_index(0, 3), None);
        assert_eq!(DateOrder::OldestFirst.prior_index(2, 3), Some(1));
    }

    #[test]
    fn newest_to_oldest_scans_by_recency() {
        let newest: Vec<usize> = DateOrder::NewestFirst.newest_to_oldest(3).collect();
        let oldest: Vec<usize> = DateOrder::OldestFirst.newest_to_oldest(3).collect();
        assert_eq!(newest, vec![0, 1, 2]);
        assert_eq!(oldest, vec![2, 1, 0]);
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let raw = vec![RawRecord::empty(day(3)), RawRecord::empty(day(3))];
        let err = RegionSeries::new("NY", DateOrder::NewestFirst, raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert_eq!(err.field(), Some("date"));
    }

    #[test]
    fn series_rejects_wrong_direction() {
        let raw = vec![RawRecord::empty(day(1)), RawRecord::empty(day(2))];
        assert!(RegionSeries::new("NY", DateOrder::NewestFirst, raw.clone()).is_err());
        assert!(RegionSeries::new("NY", DateOrder::OldestFirst, raw).is_ok());
    }

    #[test]
    fn series_rejects_empty_region() {
        let err = RegionSeries::new("WY", DateOrder::NewestFirst, Vec::new()).unwrap_err();
        assert_eq!(err.region(), Some("WY"));
    }

    #[test]
    fn latest_respects_order() {
        let raw = vec![RawRecord::empty(day(1)), RawRecord::empty(day(2))];
        let series = RegionSeries::new("NY", DateOrder::OldestFirst, raw).unwrap();
        assert_eq!(series.latest().unwrap().date(), day(2));
    }

    #[test]
    fn population_lookup_is_strict() {
        let table = PopulationTable::from_entries([("NY", 19_450_000u64)]).unwrap();
        assert_eq!(table.get("NY").unwrap().get(), 19_450_000);

        let err = table.get("ZZ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.region(), Some("ZZ"));
    }

    #[test]
    fn population_rejects_zero_and_duplicates() {
        let mut table = PopulationTable::new();
        assert!(table.insert("NY", 0).is_err());
        table.insert("NY", 10).unwrap();
        assert!(table.insert("NY", 11).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn window_must_be_positive() {
        assert!(Window::new(0).is_err());
        assert_eq!(Window::new(7).unwrap().get(), 7);
        assert_eq!(Window::default().get(), 1);
    }
}
