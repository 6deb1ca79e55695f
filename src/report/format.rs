//! Formatted terminal output for a forecast run.
//!
//! Formatting lives here so the fitting code never builds strings and output
//! changes stay localized.

use crate::domain::{ErrorMetrics, RunConfig, RunOutput, TimeSeries};

/// Format the run summary: inputs, configuration, split, and hold-out metrics.
pub fn format_run_summary(run: &RunOutput, config: &RunConfig) -> String {
    let fc = &config.forecast;
    let mut out = String::new();

    out.push_str("=== budget-forecast - Monthly Budget Forecast ===\n");
    out.push_str(&format!("Input: {}\n", config.input.display()));
    out.push_str(&format!(
        "Backend: {} | mode={:?} | freq={} | seed={}\n",
        config.backend.display_name(),
        fc.seasonality_mode,
        fc.frequency.code(),
        fc.seed,
    ));
    out.push_str(&format!(
        "Split: {:.0}% | train {} | test {}\n",
        config.split_fraction * 100.0,
        fmt_range(&run.split.train),
        fmt_range(&run.split.test),
    ));
    out.push_str(&format!(
        "Forecast: {} points ({} to {})\n",
        run.forecast.len(),
        run.forecast.points.first().map(|p| p.date.to_string()).unwrap_or_default(),
        run.forecast.points.last().map(|p| p.date.to_string()).unwrap_or_default(),
    ));

    out.push('\n');
    out.push_str(&format_metrics(run.metrics.as_ref()));
    out
}

/// Format hold-out accuracy, or a note when there is nothing to compare.
pub fn format_metrics(metrics: Option<&ErrorMetrics>) -> String {
    let Some(m) = metrics else {
        return "Test metrics: n/a (empty test range)\n".to_string();
    };
    let mape = m.mape.map(|v| format!("{v:.2}%")).unwrap_or_else(|| "n/a".to_string());
    format!(
        "Test metrics (n={}): MAE={:.2} RMSE={:.2} MAPE={mape}\n",
        m.n, m.mae, m.rmse
    )
}

/// Format the test range side by side with the forecast.
pub fn format_test_table(run: &RunOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>14} {:>14} {:>14}", "date", "actual", "forecast", "error"));
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<14} {:-<14} {:-<14}", "", "", "", ""));
    out.push('\n');

    for obs in run.split.test.points() {
        let Some(p) = run.forecast.get(obs.date) else {
            continue;
        };
        out.push_str(&format!(
            "{:<10} {:>14.2} {:>14.2} {:>14.2}\n",
            obs.date,
            obs.value,
            p.yhat,
            obs.value - p.yhat,
        ));
    }
    out
}

fn fmt_range(series: &TimeSeries) -> String {
    match (series.first(), series.last()) {
        (Some(a), Some(b)) => format!("n={} [{} .. {}]", series.len(), a.date, b.date),
        _ => "n=0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::calendar::month_end;
    use crate::domain::{ForecastPoint, ForecastResult, Observation, Split};

    fn run(metrics: Option<ErrorMetrics>) -> RunOutput {
        let obs = |m: u32, v: f64| Observation::new(month_end(2024, m).unwrap(), v);
        RunOutput {
            split: Split {
                train: TimeSeries::new(vec![obs(1, 100.0), obs(2, 102.0)]).unwrap(),
                test: TimeSeries::new(vec![obs(3, 104.0)]).unwrap(),
            },
            forecast: ForecastResult {
                backend: "seasonal".to_string(),
                points: (1..=3)
                    .map(|m| ForecastPoint {
                        date: month_end(2024, m).unwrap(),
                        yhat: 100.0 + 2.0 * (m - 1) as f64 - 1.0,
                        trend: 0.0,
                        seasonal: 0.0,
                    })
                    .collect(),
            },
            metrics,
        }
    }

    #[test]
    fn summary_mentions_split_and_metrics() {
        let metrics = ErrorMetrics {
            n: 1,
            mae: 1.0,
            rmse: 1.0,
            mape: Some(0.96),
        };
        let config = RunConfig {
            input: PathBuf::from("budgetdata.csv"),
            ..RunConfig::default()
        };
        let s = format_run_summary(&run(Some(metrics)), &config);

        assert!(s.contains("Input: budgetdata.csv"));
        assert!(s.contains("freq=ME | seed=42"));
        assert!(s.contains("train n=2 [2024-01-31 .. 2024-02-29]"));
        assert!(s.contains("Forecast: 3 points (2024-01-31 to 2024-03-31)"));
        assert!(s.contains("MAE=1.00 RMSE=1.00 MAPE=0.96%"));
    }

    #[test]
    fn missing_metrics_are_reported() {
        assert_eq!(format_metrics(None), "Test metrics: n/a (empty test range)\n");
    }

    #[test]
    fn test_table_lists_test_rows_only() {
        let table = format_test_table(&run(None));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("2024-03-31"));
        assert!(lines[2].trim_end().ends_with("1.00"));
    }
}
