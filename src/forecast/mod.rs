//! Forecasting backends.
//!
//! The pipeline only knows the [`Forecaster`] capability: fit on a training
//! series, then predict over a horizon. Backends own their model type and
//! configuration, so a new backend plugs in without touching the pipeline.

use crate::domain::{ForecastResult, Frequency, Horizon, TimeSeries};
use crate::error::AppError;

pub mod holt_winters;
pub mod seasonal;

pub use holt_winters::HoltWintersForecaster;
pub use seasonal::SeasonalForecaster;

/// A fit/predict forecasting backend.
///
/// Contract: deterministic for a fixed configuration (including seed), and
/// `predict` returns exactly one point per horizon date, in horizon order.
pub trait Forecaster {
    type Model;

    /// Human-readable backend name (used in reports and exports).
    fn name(&self) -> &'static str;

    fn fit(&self, train: &TimeSeries) -> Result<Self::Model, AppError>;

    fn predict(&self, model: &Self::Model, horizon: &Horizon) -> Result<ForecastResult, AppError>;
}

/// Reject training data whose spacing does not match `frequency`.
///
/// Uses the median gap so that a single missing month does not fail the run.
pub fn check_cadence(train: &TimeSeries, frequency: Frequency) -> Result<(), AppError> {
    let mut gaps: Vec<i64> = train
        .points()
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days())
        .collect();
    if gaps.is_empty() {
        return Ok(());
    }
    gaps.sort_unstable();
    let median = gaps[gaps.len() / 2];

    let (lo, hi) = frequency.cadence_days();
    if median < lo || median > hi {
        return Err(AppError::model(format!(
            "Training data cadence (median gap {median} days) does not match frequency {} ({lo}-{hi} days).",
            frequency.code()
        )));
    }
    Ok(())
}
