//! Peak detection over `new_pos`.

use crate::domain::{DailyRecord, DateOrder, RegionSeries, SeriesPeak};

/// Find the peak of `new_pos` and broadcast it onto every record.
pub fn detect(series: &mut RegionSeries) -> SeriesPeak {
    let peak = find_peak(series.records(), series.order());
    series.set_peak(peak);
    for record in series.records_mut() {
        record.peak = Some(peak);
    }
    peak
}

/// Maximum defined `new_pos`, dated at the most recent record that reaches it.
///
/// Records are scanned newest to oldest and the first match wins, so ties go
/// to the latest date. With no defined `new_pos` both fields are `None`.
pub fn find_peak(records: &[DailyRecord], order: DateOrder) -> SeriesPeak {
    let peak_rate = records.iter().filter_map(DailyRecord::new_pos).max();
    let peak_date = peak_rate.and_then(|rate| {
        order
            .newest_to_oldest(records.len())
            .find(|&i| records[i].new_pos() == Some(rate))
            .map(|i| records[i].date())
    });

    SeriesPeak {
        peak_rate,
        peak_date,
    }
}
