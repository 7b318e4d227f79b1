//! CSV ingest for the daily count exports and the population table.
//!
//! This module turns the raw exports into `RawRecord`s and a `PopulationTable`.
//!
//! Design goals:
//! - **Strict schema** for the columns the engine reads (clear errors)
//! - **Fail fast**: a bad date or unreadable row aborts the load with its line number
//! - **Strict counts**: blank counts are "not reported" (`None`); anything else
//!   that is not a non-negative whole number aborts the load
//! - **Separation of concerns**: no metric logic here
//!
//! Columns the engine does not use (grades, scores, the pre-computed
//! `*Increase` columns, ...) are ignored rather than dropped explicitly.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use chrono::NaiveDate;
use csv::StringRecord;
use log::info;

use crate::domain::{PopulationTable, RawRecord};
use crate::error::{AppError, ErrorKind};
use crate::io::{PopulationSource, RawDataSource};
use crate::partition::RegionRow;

pub const STATE_DAILY_FILE: &str = "state_daily.csv";
pub const US_DAILY_FILE: &str = "us_daily.csv";
pub const STATE_POPS_FILE: &str = "state_pops.csv";

/// Population table layout (headerless): name, population, region id.
const POPULATION_COLUMN: usize = 1;
const POPULATION_REGION_COLUMN: usize = 2;

/// Count columns, as normalized header names.
const POSITIVE: &str = "positive";
const NEGATIVE: &str = "negative";
const HOSPITALIZED_CUMULATIVE: &str = "hospitalizedcumulative";
const DEATH: &str = "death";
const RECOVERED: &str = "recovered";
const COUNT_COLUMNS: [&str; 5] = [POSITIVE, NEGATIVE, HOSPITALIZED_CUMULATIVE, DEATH, RECOVERED];

/// Reads the three input files from one directory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn open(&self, name: &str) -> Result<File, AppError> {
        let path = self.dir.join(name);
        File::open(&path).map_err(|e| {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to open CSV '{}': {e}", path.display()),
            )
        })
    }
}

impl RawDataSource for CsvSource {
    fn combined_table(&self) -> Result<Vec<RegionRow>, AppError> {
        let rows = read_state_daily(self.open(STATE_DAILY_FILE)?)?;
        info!("read {} rows from {STATE_DAILY_FILE}", rows.len());
        Ok(rows)
    }

    fn nationwide_series(&self) -> Result<Vec<RawRecord>, AppError> {
        let records = read_national_daily(self.open(US_DAILY_FILE)?)?;
        info!("read {} rows from {US_DAILY_FILE}", records.len());
        Ok(records)
    }
}

impl PopulationSource for CsvSource {
    fn population_table(&self) -> Result<PopulationTable, AppError> {
        let table = read_populations(self.open(STATE_POPS_FILE)?)?;
        info!("read {} populations from {STATE_POPS_FILE}", table.len());
        Ok(table)
    }
}

/// Read the combined per-state export (requires a `state` column).
pub fn read_state_daily<R: Read>(reader: R) -> Result<Vec<RegionRow>, AppError> {
    read_daily(reader, true)?
        .into_iter()
        .map(|(region, record)| -> Result<RegionRow, AppError> {
            let region = region.ok_or_else(|| {
                AppError::new(
                    ErrorKind::MalformedInput,
                    format!("Missing region for row dated {}.", record.date),
                )
                .with_field("state")
            })?;
            Ok(RegionRow { region, record })
        })
        .collect()
}

/// Read the nationwide export (same schema, no `state` column).
pub fn read_national_daily<R: Read>(reader: R) -> Result<Vec<RawRecord>, AppError> {
    Ok(read_daily(reader, false)?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// Read the headerless population table.
pub fn read_populations<R: Read>(reader: R) -> Result<PopulationTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = PopulationTable::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 1;
        let record = result.map_err(|e| csv_error(line, e))?;

        let region = record
            .get(POPULATION_REGION_COLUMN)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::new(
                    ErrorKind::MalformedInput,
                    format!("Line {line}: missing region id in population table."),
                )
                .with_field("region")
            })?;

        let population = record
            .get(POPULATION_COLUMN)
            .and_then(|s| parse_count(Some(s.replace(',', "").as_str())).ok().flatten())
            .ok_or_else(|| {
                AppError::new(
                    ErrorKind::MalformedInput,
                    format!("Line {line}: invalid population."),
                )
                .with_region(region)
                .with_field("population")
            })?;

        table.insert(region, population)?;
    }
    Ok(table)
}

fn read_daily<R: Read>(
    reader: R,
    with_region: bool,
) -> Result<Vec<(Option<String>, RawRecord)>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| {
            AppError::new(ErrorKind::MalformedInput, format!("Failed to read CSV headers: {e}"))
        })?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map, with_region)?;

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| csv_error(line, e))?;

        let raw_date = get_optional(&record, &header_map, "date").ok_or_else(|| {
            AppError::new(ErrorKind::MalformedInput, format!("Line {line}: missing date."))
                .with_field("date")
        })?;
        let region = if with_region {
            get_optional(&record, &header_map, "state").map(str::to_string)
        } else {
            None
        };
        let date = parse_date(raw_date)
            .map_err(|msg| row_error(line, msg, "date", region.as_deref()))?;

        let count = |name: &'static str| {
            parse_count(get_optional(&record, &header_map, name))
                .map_err(|msg| row_error(line, msg, name, region.as_deref()))
        };
        let raw = RawRecord {
            date,
            positive: count(POSITIVE)?,
            negative: count(NEGATIVE)?,
            hospitalized_cumulative: count(HOSPITALIZED_CUMULATIVE)?,
            death: count(DEATH)?,
            recovered: count(RECOVERED)?,
        };
        out.push((region, raw));
    }

    Ok(out)
}

fn ensure_required_columns_exist(
    header_map: &HashMap<String, usize>,
    with_region: bool,
) -> Result<(), AppError> {
    if !header_map.contains_key("date") {
        return Err(AppError::new(ErrorKind::MalformedInput, "Missing required column: `date`"));
    }
    if with_region && !header_map.contains_key("state") {
        return Err(AppError::new(ErrorKind::MalformedInput, "Missing required column: `state`"));
    }
    for name in COUNT_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::new(
                ErrorKind::MalformedInput,
                format!("Missing required column: `{name}`"),
            ));
        }
    }
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // The daily exports use compact `YYYYMMDD`; ISO dates are accepted too.
    const FMTS: [&str; 2] = ["%Y%m%d", "%Y-%m-%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!("Invalid date '{s}'. Expected YYYYMMDD or YYYY-MM-DD."))
}

/// Non-negative whole count. A blank cell is not reported; `12.0` is accepted
/// because some exports write counts as floats.
fn parse_count(s: Option<&str>) -> Result<Option<u64>, String> {
    let Some(s) = s else {
        return Ok(None);
    };
    if let Ok(v) = s.parse::<u64>() {
        return Ok(Some(v));
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as u64)),
        _ => Err(format!("Invalid count '{s}'. Expected a non-negative whole number.")),
    }
}

fn row_error(line: usize, msg: String, field: &'static str, region: Option<&str>) -> AppError {
    let err =
        AppError::new(ErrorKind::MalformedInput, format!("Line {line}: {msg}")).with_field(field);
    match region {
        Some(region) => err.with_region(region),
        None => err,
    }
}

fn csv_error(line: usize, e: csv::Error) -> AppError {
    AppError::new(ErrorKind::MalformedInput, format!("Line {line}: CSV parse error: {e}"))
}
