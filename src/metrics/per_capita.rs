//! Per-capita normalization.
//!
//! Values are divided by the region population and left unscaled; multiplying by
//! 100 000 for display is up to the consumer (`report::per_100k`).

use std::num::NonZeroU64;

use crate::domain::{DailyMetrics, PerCapita, RegionSeries};

/// Fill [`PerCapita`] for every record that already has daily metrics.
pub fn normalize(series: &mut RegionSeries, population: NonZeroU64) {
    for record in series.records_mut() {
        record.per_capita = record.daily.as_ref().map(|d| per_capita(d, population));
    }
}

pub fn per_capita(daily: &DailyMetrics, population: NonZeroU64) -> PerCapita {
    PerCapita {
        new_pos_pc: per_person(daily.new_pos, population),
        new_neg_pc: per_person(daily.new_neg, population),
        new_tests_pc: per_person(daily.new_tests, population),
        total_tests_pc: per_person(daily.total_tests, population),
        new_hosp_pc: per_person(daily.new_hosp, population),
        new_deaths_pc: per_person(daily.new_deaths, population),
    }
}

pub(crate) fn per_person(value: Option<i64>, population: NonZeroU64) -> Option<f64> {
    value.map(|v| v as f64 / population.get() as f64)
}

pub(crate) fn per_person_f64(value: Option<f64>, population: NonZeroU64) -> Option<f64> {
    value.map(|v| v / population.get() as f64)
}
