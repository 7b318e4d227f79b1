//! Day-over-day deltas and rates.
//!
//! Every delta compares a record with the previous calendar day, located via
//! [`DateOrder::prior_index`]. The oldest record has no prior day, so all of its
//! deltas (and everything computed from them) are `None`.

use log::warn;

use crate::domain::{DailyMetrics, RawRecord, RegionSeries};

/// Derive [`DailyMetrics`] for every record of `series`, in place.
pub fn compute(series: &mut RegionSeries) {
    let order = series.order();
    let records = series.records();
    let len = records.len();

    let metrics: Vec<DailyMetrics> = (0..len)
        .map(|i| {
            let prior = order.prior_index(i, len).map(|j| &records[j].raw);
            daily_metrics(&records[i].raw, prior)
        })
        .collect();

    let negative_active = metrics.iter().filter(|m| m.active.is_some_and(|a| a < 0)).count();
    let negative_new_pos = metrics.iter().filter(|m| m.new_pos.is_some_and(|d| d < 0)).count();
    if negative_active > 0 {
        warn!(
            "{}: {negative_active} records with negative active count (positive < death + recovered)",
            series.region()
        );
    }
    if negative_new_pos > 0 {
        warn!(
            "{}: {negative_new_pos} records with a downward revision of `positive`",
            series.region()
        );
    }

    for (record, m) in series.records_mut().iter_mut().zip(metrics) {
        record.daily = Some(m);
    }
}

/// Metrics for one record given the record of the previous calendar day.
pub fn daily_metrics(current: &RawRecord, prior: Option<&RawRecord>) -> DailyMetrics {
    let delta = |field: fn(&RawRecord) -> Option<u64>| -> Option<i64> {
        let prior = prior?;
        signed(field(current)?)?.checked_sub(signed(field(prior)?)?)
    };

    let new_pos = delta(|r| r.positive);
    let new_neg = delta(|r| r.negative);
    let new_tests = sum(new_pos, new_neg);
    let new_hosp = delta(|r| r.hospitalized_cumulative);
    let new_deaths = delta(|r| r.death);

    let positive = current.positive.and_then(signed);
    let total_tests = sum(positive, current.negative.and_then(signed));
    let active = active_count(current);

    DailyMetrics {
        new_pos,
        new_neg,
        new_tests,
        total_tests,
        new_hosp,
        new_deaths,
        daily_pct_pos: ratio(new_pos, new_tests).map(|r| 100.0 * r),
        active,
        daily_growth_factor_a: ratio(new_pos, positive),
        daily_growth_factor_b: ratio(new_pos, active),
    }
}

/// `positive − death − recovered`, unclamped.
fn active_count(r: &RawRecord) -> Option<i64> {
    signed(r.positive?)?
        .checked_sub(signed(r.death?)?)?
        .checked_sub(signed(r.recovered?)?)
}

/// `num / den`; a zero or missing divisor yields `None`.
pub fn ratio(num: Option<i64>, den: Option<i64>) -> Option<f64> {
    let den = den?;
    if den == 0 {
        return None;
    }
    Some(num? as f64 / den as f64)
}

fn sum(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    a?.checked_add(b?)
}

fn signed(v: u64) -> Option<i64> {
    i64::try_from(v).ok()
}
