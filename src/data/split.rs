//! Chronological train/test split.

use tracing::info;

use crate::domain::{Split, TimeSeries};
use crate::error::AppError;

/// Index at which a series of `len` entries is cut: `floor(fraction × len)`.
pub fn split_index(len: usize, fraction: f64) -> usize {
    ((len as f64) * fraction).floor() as usize
}

/// Split `series` into a training prefix and a test suffix.
///
/// No shuffling: `train` is the first `floor(fraction × len)` entries, `test`
/// the rest. Short series are not special-cased; an empty training prefix is
/// reported by the forecaster when it tries to fit.
pub fn split_series(series: &TimeSeries, fraction: f64) -> Result<Split, AppError> {
    if !(fraction.is_finite() && fraction > 0.0 && fraction < 1.0) {
        return Err(AppError::config(format!(
            "Invalid split fraction {fraction} (must be in (0, 1))."
        )));
    }

    let n = series.len();
    let idx = split_index(n, fraction).min(n);
    let split = Split {
        train: series.slice(0..idx),
        test: series.slice(idx..n),
    };

    info!(train = split.train.len(), test = split.test.len(), fraction, "split series");
    Ok(split)
}
