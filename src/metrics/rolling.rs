//! Rolling-average smoothing.
//!
//! The window at storage index `i` covers indices `i + 1 - w ..= i`, i.e. it
//! trails in *storage* order. For newest-first data that means a record is
//! averaged with the `w - 1` *more recent* days, not the older ones.
//! Whether it should look backwards in time instead is an open product question
//! (DESIGN.md); do not flip the direction here.
//!
//! The first `w - 1` stored records get `None` (no partial windows), and any
//! `None` inside a window makes that mean `None`.

use std::num::NonZeroU64;

use log::debug;

use crate::domain::{DailyMetrics, RegionSeries, RollingMetrics, Window};
use crate::metrics::per_capita::per_person_f64;

/// Trailing mean over `window` consecutive stored values.
pub fn rolling_mean(values: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
    let w = window.get();
    (0..values.len())
        .map(|i| {
            if i + 1 < w {
                return None;
            }
            let sum = values[i + 1 - w..=i]
                .iter()
                .try_fold(0.0, |acc, v| v.map(|x| acc + x))?;
            Some(sum / w as f64)
        })
        .collect()
}

/// Compute [`RollingMetrics`] for `window`, replacing any previous window.
///
/// Only reads the daily metrics; deltas and per-capita fields are untouched.
pub fn smooth(series: &mut RegionSeries, window: Window, population: NonZeroU64) {
    let column = |f: fn(&DailyMetrics) -> Option<f64>| -> Vec<Option<f64>> {
        let values: Vec<Option<f64>> = series
            .records()
            .iter()
            .map(|r| r.daily.as_ref().and_then(f))
            .collect();
        rolling_mean(&values, window)
    };

    let new_cases = column(|d| d.new_pos.map(|v| v as f64));
    let new_hosp = column(|d| d.new_hosp.map(|v| v as f64));
    let new_deaths = column(|d| d.new_deaths.map(|v| v as f64));
    let pct_pos = column(|d| d.daily_pct_pos);

    debug!("{}: rolling window {window}", series.region());

    for (i, record) in series.records_mut().iter_mut().enumerate() {
        record.rolling = Some(RollingMetrics {
            window,
            new_cases_rolling: new_cases[i],
            new_hosp_rolling: new_hosp[i],
            new_deaths_rolling: new_deaths[i],
            daily_pct_pos_rolling: pct_pos[i],
            new_cases_rolling_pc: per_person_f64(new_cases[i], population),
            new_hosp_rolling_pc: per_person_f64(new_hosp[i], population),
            new_deaths_rolling_pc: per_person_f64(new_deaths[i], population),
        });
    }
    series.set_window(window);
}
