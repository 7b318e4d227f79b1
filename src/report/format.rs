//! Terse text summaries for terminal inspection.
//!
//! We keep formatting code in one place so:
//! - the metric code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::PipelineOutput;
use crate::domain::RegionSeries;

/// Scale a per-capita fraction to "per 100 000 people".
pub fn per_100k(value: f64) -> f64 {
    value * 100_000.0
}

/// One line describing the most recent state of a region.
pub fn format_region_summary(series: &RegionSeries) -> String {
    let Some(latest) = series.latest() else {
        return format!("{:<5} (no records)", series.region());
    };

    let new_cases = latest.new_pos().map(|v| v.to_string());
    let rolling = latest.rolling.as_ref();
    let rolling_cases = rolling.and_then(|r| r.new_cases_rolling);
    let rolling_per_100k = rolling
        .and_then(|r| r.new_cases_rolling_pc)
        .map(per_100k);
    let pct_pos = latest.daily.as_ref().and_then(|d| d.daily_pct_pos);
    let peak = series.peak().unwrap_or_default();

    format!(
        "{:<5} {} | new cases {} (rolling {}, {}/100k) | pct pos {} | peak {} on {}",
        series.region(),
        latest.date(),
        or_na(new_cases),
        fmt_opt(rolling_cases, 1),
        fmt_opt(rolling_per_100k, 2),
        fmt_pct(pct_pos),
        or_na(peak.peak_rate.map(|v| v.to_string())),
        or_na(peak.peak_date.map(|d| d.to_string())),
    )
}

/// Header line plus one summary line per region, in region-id order.
pub fn format_run_summary(output: &PipelineOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== epi-indicators: {} regions | window={} ===\n",
        output.regions.len(),
        output.window
    ));
    for series in output.regions.values() {
        out.push_str(&format_region_summary(series));
        out.push('\n');
    }
    out
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "n/a".to_string(),
    }
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| "n/a".to_string())
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}%"),
        None => "n/a".to_string(),
    }
}
