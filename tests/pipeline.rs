use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use epi_indicators::app::{self, pipeline};
use epi_indicators::config::PipelineConfig;
use epi_indicators::domain::{NATIONWIDE, PopulationTable, RawRecord, Window};
use epi_indicators::io::InMemorySource;
use epi_indicators::partition::RegionRow;
use epi_indicators::report::format_run_summary;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
}

fn record(
    d: u32,
    positive: u64,
    negative: u64,
    hospitalized: u64,
    death: u64,
    recovered: u64,
) -> RawRecord {
    RawRecord {
        date: day(d),
        positive: Some(positive),
        negative: Some(negative),
        hospitalized_cumulative: Some(hospitalized),
        death: Some(death),
        recovered: Some(recovered),
    }
}

fn row(region: &str, record: RawRecord) -> RegionRow {
    RegionRow {
        region: region.to_string(),
        record,
    }
}

fn worked_example() -> (InMemorySource, PopulationTable) {
    let rows = vec![
        row("X", record(3, 120, 80, 12, 5, 10)),
        row("X", record(2, 100, 70, 9, 4, 8)),
        row("X", record(1, 80, 60, 5, 3, 6)),
    ];
    let nationwide = vec![record(3, 120, 80, 12, 5, 10), record(2, 100, 70, 9, 4, 8)];
    let pops = PopulationTable::from_entries([("X", 1000u64), (NATIONWIDE, 1000)]).unwrap();
    (InMemorySource::new(rows, nationwide), pops)
}

fn approx(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-9)
}

#[test]
fn worked_example_end_to_end() {
    epi_indicators::logging::init();

    let (source, pops) = worked_example();
    let out = pipeline::run(&source, &pops, &PipelineConfig::default()).unwrap();
    let x = out.region("X").unwrap();
    let records = x.records();

    let new_pos: Vec<Option<i64>> = records.iter().map(|r| r.new_pos()).collect();
    assert_eq!(new_pos, vec![Some(20), Some(20), None]);

    let daily: Vec<_> = records.iter().map(|r| r.daily.clone().unwrap()).collect();
    assert_eq!(daily.iter().map(|d| d.new_neg).collect::<Vec<_>>(), vec![Some(10), Some(10), None]);
    assert_eq!(
        daily.iter().map(|d| d.new_tests).collect::<Vec<_>>(),
        vec![Some(30), Some(30), None]
    );
    assert!(approx(daily[0].daily_pct_pos, 66.666_666_666));
    assert!(approx(daily[1].daily_pct_pos, 66.666_666_666));
    assert_eq!(daily[2].daily_pct_pos, None);
    assert_eq!(
        daily.iter().map(|d| d.active).collect::<Vec<_>>(),
        vec![Some(105), Some(88), Some(71)]
    );
    assert_eq!(
        daily.iter().map(|d| d.new_deaths).collect::<Vec<_>>(),
        vec![Some(1), Some(1), None]
    );
    assert_eq!(daily.iter().map(|d| d.new_hosp).collect::<Vec<_>>(), vec![Some(3), Some(4), None]);

    let peak = x.peak().unwrap();
    assert_eq!(peak.peak_rate, Some(20));
    assert_eq!(peak.peak_date, Some(day(3)));
    assert!(records.iter().all(|r| r.peak == Some(peak)));

    let pc: Vec<Option<f64>> = records
        .iter()
        .map(|r| r.per_capita.as_ref().unwrap().new_pos_pc)
        .collect();
    assert!(approx(pc[0], 0.02));
    assert!(approx(pc[1], 0.02));
    assert_eq!(pc[2], None);

    let latest_pc = records[0].per_capita.as_ref().unwrap();
    assert!(approx(latest_pc.new_hosp_pc, 0.003));
    assert!(approx(latest_pc.new_deaths_pc, 0.001));
    assert!(approx(records[1].per_capita.as_ref().unwrap().new_hosp_pc, 0.004));

    // Window 1 reproduces the unsmoothed columns exactly.
    for r in records {
        let rolling = r.rolling.as_ref().unwrap();
        let daily = r.daily.as_ref().unwrap();
        let per_capita = r.per_capita.as_ref().unwrap();
        assert_eq!(rolling.new_cases_rolling, r.new_pos().map(|v| v as f64));
        assert_eq!(rolling.new_hosp_rolling, daily.new_hosp.map(|v| v as f64));
        assert_eq!(rolling.new_deaths_rolling, daily.new_deaths.map(|v| v as f64));
        assert_eq!(rolling.daily_pct_pos_rolling, daily.daily_pct_pos);
        assert_eq!(rolling.new_cases_rolling_pc, per_capita.new_pos_pc);
        assert_eq!(rolling.new_hosp_rolling_pc, per_capita.new_hosp_pc);
        assert_eq!(rolling.new_deaths_rolling_pc, per_capita.new_deaths_pc);
    }
}

#[test]
fn window_two_trails_in_storage_order() {
    let (source, pops) = worked_example();
    let config = PipelineConfig::default().with_window(Window::new(2).unwrap());
    let out = pipeline::run(&source, &pops, &config).unwrap();
    let records = out.region("X").unwrap().records();

    let rolling: Vec<_> = records.iter().map(|r| r.rolling.clone().unwrap()).collect();
    assert!(rolling.iter().all(|r| r.window.get() == 2));

    // Index 0 has no full window; index 2 averages over the undefined oldest day.
    for r in [&rolling[0], &rolling[2]] {
        assert_eq!(r.new_cases_rolling, None);
        assert_eq!(r.new_hosp_rolling, None);
        assert_eq!(r.new_deaths_rolling, None);
        assert_eq!(r.daily_pct_pos_rolling, None);
        assert_eq!(r.new_cases_rolling_pc, None);
        assert_eq!(r.new_hosp_rolling_pc, None);
        assert_eq!(r.new_deaths_rolling_pc, None);
    }

    // Index 1 averages the two newest days: hosp (3 + 4) / 2, deaths (1 + 1) / 2.
    let mid = &rolling[1];
    assert!(approx(mid.new_cases_rolling, 20.0));
    assert!(approx(mid.new_hosp_rolling, 3.5));
    assert!(approx(mid.new_deaths_rolling, 1.0));
    assert!(approx(mid.daily_pct_pos_rolling, 200.0 / 3.0));
    assert!(approx(mid.new_cases_rolling_pc, 0.02));
    assert!(approx(mid.new_hosp_rolling_pc, 0.0035));
    assert!(approx(mid.new_deaths_rolling_pc, 0.001));
}

#[test]
fn rewindow_matches_a_fresh_run() {
    let (source, pops) = worked_example();
    let mut out = pipeline::run(&source, &pops, &PipelineConfig::default()).unwrap();
    let window = Window::new(2).unwrap();
    out.rewindow(window, &pops).unwrap();

    let config = PipelineConfig::default().with_window(window);
    let fresh = pipeline::run(&source, &pops, &config).unwrap();
    assert_eq!(out.regions, fresh.regions);

    let summary = format_run_summary(&out);
    assert!(summary.starts_with("=== epi-indicators: 2 regions | window=2 ==="));
}

#[test]
fn serialized_output_uses_null_for_undefined() {
    let (source, pops) = worked_example();
    let out = pipeline::run(&source, &pops, &PipelineConfig::default()).unwrap();
    let json = serde_json::to_value(&out).unwrap();

    let oldest = &json["regions"]["X"]["records"][2];
    assert_eq!(oldest["raw"]["date"], "2020-04-01");
    assert!(oldest["daily"]["new_pos"].is_null());
    assert_eq!(oldest["daily"]["active"], 71);
    assert_eq!(json["window"], 1);
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("epi-indicators-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn csv_directory_end_to_end() {
    let dir = scratch_dir("csv");
    fs::write(
        dir.join("state_daily.csv"),
        "date,state,positive,negative,hospitalizedCumulative,death,recovered,grade\n\
20200403,NY,300,700,40,9,,A\n\
20200403,VT,12,100,,1,2,B\n\
20200402,NY,200,600,30,5,,A\n\
20200402,VT,10,90,,1,1,B\n",
    )
    .unwrap();
    fs::write(
        dir.join("us_daily.csv"),
        "date,positive,negative,hospitalizedCumulative,death,recovered\n\
20200403,312,800,40,10,2\n\
20200402,210,690,30,6,1\n",
    )
    .unwrap();
    fs::write(
        dir.join("state_pops.csv"),
        "New York,20000,NY\nVermont,600,VT\nUnited States,20600,USA\n",
    )
    .unwrap();

    let out = app::run_from_dir_with(&dir, &PipelineConfig::default()).unwrap();
    assert_eq!(out.regions.len(), 3);

    let ny = out.region("NY").unwrap();
    let latest = ny.latest().unwrap();
    let daily = latest.daily.as_ref().unwrap();
    assert_eq!(daily.new_pos, Some(100));
    assert_eq!(daily.new_hosp, Some(10));
    assert_eq!(daily.active, None);
    assert!(approx(daily.daily_pct_pos, 50.0));
    assert!(approx(latest.per_capita.as_ref().unwrap().new_pos_pc, 0.005));

    let us = out.region(NATIONWIDE).unwrap();
    assert_eq!(us.records()[0].new_pos(), Some(102));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn csv_directory_missing_population_is_lookup_error() {
    let dir = scratch_dir("nopop");
    fs::write(
        dir.join("state_daily.csv"),
        "date,state,positive,negative,hospitalizedCumulative,death,recovered\n20200402,NY,1,1,1,1,1\n",
    )
    .unwrap();
    fs::write(
        dir.join("us_daily.csv"),
        "date,positive,negative,hospitalizedCumulative,death,recovered\n20200402,1,1,1,1,1\n",
    )
    .unwrap();
    fs::write(dir.join("state_pops.csv"), "United States,100,USA\n").unwrap();

    let err = app::run_from_dir_with(&dir, &PipelineConfig::default()).unwrap_err();
    assert_eq!(err.kind(), epi_indicators::ErrorKind::Lookup);
    assert_eq!(err.region(), Some("NY"));

    fs::remove_dir_all(&dir).ok();
}
