//! Reporting utilities: hold-out metrics and formatted terminal output.

use tracing::warn;

use crate::domain::{ErrorMetrics, ForecastResult, TimeSeries};

pub mod format;

pub use format::*;

/// Compare the forecast against the held-out test values.
///
/// Returns `None` when the test range is empty or not covered by the forecast.
pub fn compute_metrics(test: &TimeSeries, forecast: &ForecastResult) -> Option<ErrorMetrics> {
    let pairs: Vec<(f64, f64)> = test
        .points()
        .iter()
        .filter_map(|obs| forecast.get(obs.date).map(|p| (obs.value, p.yhat)))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    if pairs.len() < test.len() {
        warn!(
            covered = pairs.len(),
            test = test.len(),
            "forecast does not cover every test date"
        );
    }

    let n = pairs.len() as f64;
    let mae = pairs.iter().map(|(a, f)| (a - f).abs()).sum::<f64>() / n;
    let rmse = (pairs.iter().map(|(a, f)| (a - f) * (a - f)).sum::<f64>() / n).sqrt();

    let pct: Vec<f64> = pairs
        .iter()
        .filter(|(a, _)| *a != 0.0)
        .map(|(a, f)| ((a - f) / a).abs())
        .collect();
    let mape = if pct.is_empty() {
        None
    } else {
        Some(100.0 * pct.iter().sum::<f64>() / pct.len() as f64)
    };

    Some(ErrorMetrics {
        n: pairs.len(),
        mae,
        rmse,
        mape,
    })
}
