//! Seasonal regression model evaluation.
//!
//! The fitter relies on two primitive operations per component:
//! - build a design row for a given time (for least squares / gradients)
//! - evaluate the component given its coefficients (for predictions)
//!
//! Time enters in two forms:
//! - `t`: normalized to `[0, 1]` over the training window (trend)
//! - `t_days`: days since the first training date (seasonality)

use chrono::NaiveDate;

use crate::domain::{ForecastPoint, SeasonalityMode};
use crate::math::{YEAR_DAYS, fourier_features, hinge};

/// A fitted trend + yearly seasonality model.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalModel {
    pub mode: SeasonalityMode,
    /// First training date (`t = 0`).
    pub origin: NaiveDate,
    /// Training window length in days (`t = 1`).
    pub span_days: f64,
    /// Values are divided by this before fitting.
    pub y_scale: f64,
    /// Changepoint locations in normalized time.
    pub changepoints: Vec<f64>,
    /// Fourier order; 0 disables the seasonal component.
    pub yearly_order: usize,
    /// `[offset, base slope, delta_1, ..., delta_k]`.
    pub trend_coef: Vec<f64>,
    /// `[a_1, b_1, ..., a_order, b_order]` (cos/sin pairs).
    pub season_coef: Vec<f64>,
    /// Final penalized training objective (scaled units).
    pub training_loss: f64,
}

impl SeasonalModel {
    pub fn trend_len(&self) -> usize {
        trend_len(self.changepoints.len())
    }

    pub fn season_len(&self) -> usize {
        season_len(self.yearly_order)
    }

    /// Days since origin and normalized time for `date`.
    pub fn time_of(&self, date: NaiveDate) -> (f64, f64) {
        let t_days = (date - self.origin).num_days() as f64;
        (t_days / self.span_days, t_days)
    }

    /// Trend and seasonal component for `date`, in scaled units.
    ///
    /// The seasonal value is the raw Fourier sum: a relative factor in
    /// multiplicative mode, an additive offset otherwise.
    pub fn components(&self, date: NaiveDate) -> (f64, f64) {
        let (t, t_days) = self.time_of(date);

        let mut trend_row = vec![0.0; self.trend_len()];
        fill_trend_row(t, &self.changepoints, &mut trend_row);
        let trend = dot(&trend_row, &self.trend_coef);

        let mut season_row = vec![0.0; self.season_len()];
        fill_season_row(t_days, self.yearly_order, &mut season_row);
        let season = dot(&season_row, &self.season_coef);

        (trend, season)
    }

    /// Prediction for `date` in original units.
    pub fn predict(&self, date: NaiveDate) -> ForecastPoint {
        let (trend, season) = self.components(date);
        let yhat = combine(self.mode, trend, season);
        ForecastPoint {
            date,
            yhat: yhat * self.y_scale,
            trend: trend * self.y_scale,
            // Contribution of the seasonal term in value units.
            seasonal: (yhat - trend) * self.y_scale,
        }
    }
}

pub fn trend_len(n_changepoints: usize) -> usize {
    2 + n_changepoints
}

pub fn season_len(order: usize) -> usize {
    2 * order
}

/// Fill a trend design row: `[1, t, (t - c_1)+, ..., (t - c_k)+]`.
///
/// # Panics
/// Panics if `out.len() != trend_len(changepoints.len())`.
pub fn fill_trend_row(t: f64, changepoints: &[f64], out: &mut [f64]) {
    assert_eq!(out.len(), trend_len(changepoints.len()));
    out[0] = 1.0;
    out[1] = t;
    for (j, &c) in changepoints.iter().enumerate() {
        out[2 + j] = hinge(t, c);
    }
}

/// Fill a yearly seasonality design row.
///
/// # Panics
/// Panics if `out.len() != season_len(order)`.
pub fn fill_season_row(t_days: f64, order: usize, out: &mut [f64]) {
    assert_eq!(out.len(), season_len(order));
    fourier_features(t_days, YEAR_DAYS, order, out);
}

/// Combine components per the seasonality mode.
pub fn combine(mode: SeasonalityMode, trend: f64, season: f64) -> f64 {
    match mode {
        SeasonalityMode::Multiplicative => trend * (1.0 + season),
        SeasonalityMode::Additive => trend + season,
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
