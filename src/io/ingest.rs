//! CSV ingest and normalization.
//!
//! This module turns a `(date, value)` CSV into a validated [`TimeSeries`].
//!
//! Design goals:
//! - **Strict schema** for the two required columns (clear errors, exit code 3)
//! - **Fail fast**: any unparsable row aborts the load, naming the line
//! - **Deterministic behavior**: rows are sorted by date, duplicates rejected
//! - **Separation of concerns**: no splitting or fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{ColumnMap, Observation, TimeSeries};
use crate::error::AppError;

/// Load a time series from a CSV file on disk.
pub fn load_time_series(path: &Path, columns: &ColumnMap) -> Result<TimeSeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let series = read_time_series(file, columns)?;
    info!(
        path = %path.display(),
        rows = series.len(),
        first = ?series.first().map(|o| o.date),
        last = ?series.last().map(|o| o.date),
        "loaded time series"
    );
    Ok(series)
}

/// Parse a time series from any CSV reader.
pub fn read_time_series<R: Read>(reader: R, columns: &ColumnMap) -> Result<TimeSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let date_idx = required_column(&header_map, &columns.date)?;
    let value_idx = required_column(&header_map, &columns.value)?;

    let mut points = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::data(format!("Line {line}: CSV parse error: {e}")))?;

        if record.iter().all(|field| field.is_empty()) {
            debug!(line, "skipping blank row");
            continue;
        }

        let raw_date = get_field(&record, date_idx, &columns.date, line)?;
        let raw_value = get_field(&record, value_idx, &columns.value, line)?;

        let date = parse_date(raw_date).map_err(|e| AppError::data(format!("Line {line}: {e}")))?;
        let value = parse_value(raw_value).map_err(|e| AppError::data(format!("Line {line}: {e}")))?;
        points.push(Observation::new(date, value));
    }

    if points.is_empty() {
        return Err(AppError::data("CSV contains no data rows."));
    }

    // Files are usually already chronological; the sort is stable and cheap either way.
    points.sort_by_key(|o| o.date);
    if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(AppError::data(format!("Duplicate date in input: {}", pair[0].date)));
    }

    TimeSeries::new(points)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated header names.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn required_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| AppError::data(format!("Missing required column: `{name}`")))
}

fn get_field<'a>(record: &'a StringRecord, idx: usize, name: &str, line: usize) -> Result<&'a str, AppError> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::data(format!("Line {line}: missing value for `{name}`")))
}

/// Parse a date in one of the accepted formats.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO first; the day-first forms cover common spreadsheet exports.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    // Year-month only: anchor on the first of the month.
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Ok(d);
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, YYYY-MM, DD/MM/YYYY, DD-MM-YYYY."
    ))
}

fn parse_value(s: &str) -> Result<f64, String> {
    // Thousands separators are common in budget exports.
    let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
    let v = cleaned
        .parse::<f64>()
        .map_err(|_| format!("Invalid numeric value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite numeric value '{s}'."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn load(csv: &str) -> Result<TimeSeries, AppError> {
        read_time_series(csv.as_bytes(), &ColumnMap::default())
    }

    #[test]
    fn loads_and_sorts_rows() {
        let series = load("Date,Budget\n2024-02-29,110\n2024-01-31,100\n2024-03-31,120.5\n").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), vec![100.0, 110.0, 120.5]);
        assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn header_matching_is_case_insensitive_and_bom_tolerant() {
        let series = load("\u{feff}date , BUDGET,notes\n2024-01-31,100,x\n").unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn missing_column_is_a_data_error() {
        let err = load("Date,Amount\n2024-01-31,100\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.message().contains("Budget"), "{err}");
    }

    #[test]
    fn unparsable_date_names_the_line() {
        let err = load("Date,Budget\n2024-01-31,100\nnot-a-date,110\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.message().starts_with("Line 3:"), "{err}");
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let err = load("Date,Budget\n2024-01-31,100\n2024-01-31,110\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn empty_file_is_a_data_error() {
        assert_eq!(load("Date,Budget\n").unwrap_err().kind(), ErrorKind::Data);
    }

    #[test]
    fn custom_column_names() {
        let columns = ColumnMap {
            date: "ds".to_string(),
            value: "y".to_string(),
        };
        let series = read_time_series("ds,y\n2024-01,5\n".as_bytes(), &columns).unwrap();
        assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        for s in ["2024-03-31", "2024/03/31", "31/03/2024", "31-03-2024", "2024-03-31 00:00:00"] {
            assert_eq!(parse_date(s).unwrap(), expected, "{s}");
        }
        assert!(parse_date("March 2024").is_err());
    }

    #[test]
    fn values_accept_thousands_separators() {
        assert_eq!(parse_value("1,250.5").unwrap(), 1250.5);
        assert!(parse_value("abc").is_err());
        assert!(parse_value("inf").is_err());
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let err = load_time_series(Path::new("/definitely/not/here.csv"), &ColumnMap::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }
}
