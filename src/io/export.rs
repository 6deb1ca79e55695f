//! Export forecast results to CSV.
//!
//! One row per forecast date, joined with the observed value when the date is
//! part of the loaded series, so spreadsheets can chart actual vs. predicted.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::domain::{ForecastResult, Split};
use crate::error::AppError;

/// Which part of the timeline a forecast row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Train,
    Test,
    Future,
}

#[derive(Debug, Serialize)]
struct ExportRow {
    date: NaiveDate,
    segment: Segment,
    actual: Option<f64>,
    yhat: f64,
    trend: f64,
    seasonal: f64,
}

/// Write the forecast (with actuals where known) to a CSV file.
pub fn write_forecast_csv(path: &Path, split: &Split, forecast: &ForecastResult) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::config(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for row in export_rows(split, forecast) {
        writer
            .serialize(row)
            .map_err(|e| AppError::config(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to flush export CSV: {e}")))?;

    info!(path = %path.display(), rows = forecast.len(), "wrote forecast CSV");
    Ok(())
}

fn export_rows(split: &Split, forecast: &ForecastResult) -> Vec<ExportRow> {
    let lookup = |date: NaiveDate| -> (Segment, Option<f64>) {
        for (segment, series) in [(Segment::Train, &split.train), (Segment::Test, &split.test)] {
            let points = series.points();
            if let Ok(i) = points.binary_search_by_key(&date, |o| o.date) {
                return (segment, Some(points[i].value));
            }
        }
        (Segment::Future, None)
    };

    forecast
        .points
        .iter()
        .map(|p| {
            let (segment, actual) = lookup(p.date);
            ExportRow {
                date: p.date,
                segment,
                actual,
                yhat: p.yhat,
                trend: p.trend,
                seasonal: p.seasonal,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastPoint, Observation, TimeSeries};
    use crate::domain::calendar::month_end;

    fn fixture() -> (Split, ForecastResult) {
        let obs = |m: u32, v: f64| Observation::new(month_end(2024, m).unwrap(), v);
        let split = Split {
            train: TimeSeries::new(vec![obs(1, 10.0), obs(2, 11.0)]).unwrap(),
            test: TimeSeries::new(vec![obs(3, 12.0)]).unwrap(),
        };
        let forecast = ForecastResult {
            backend: "seasonal".to_string(),
            points: (1..=4)
                .map(|m| ForecastPoint {
                    date: month_end(2024, m).unwrap(),
                    yhat: 10.0 + m as f64,
                    trend: 10.0,
                    seasonal: m as f64,
                })
                .collect(),
        };
        (split, forecast)
    }

    #[test]
    fn rows_are_tagged_by_segment() {
        let (split, forecast) = fixture();
        let rows = export_rows(&split, &forecast);
        let segments: Vec<Segment> = rows.iter().map(|r| r.segment).collect();
        assert_eq!(segments, vec![Segment::Train, Segment::Train, Segment::Test, Segment::Future]);
        assert_eq!(rows[2].actual, Some(12.0));
        assert_eq!(rows[3].actual, None);
    }

    #[test]
    fn writes_header_and_one_line_per_point() {
        let (split, forecast) = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        write_forecast_csv(&path, &split, &forecast).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,segment,actual,yhat,trend,seasonal");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "2024-03-31,test,12.0,13.0,10.0,3.0");
        assert_eq!(lines[4], "2024-04-30,future,,14.0,10.0,4.0");
    }
}
