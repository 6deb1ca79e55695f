//! Holt–Winters (triple exponential) smoothing.
//!
//! ```text
//! Level:    L_t = α y_t / s_{t-m} + (1 - α)(L_{t-1} + T_{t-1})        (multiplicative)
//! Trend:    T_t = β (L_t - L_{t-1}) + (1 - β) T_{t-1}
//! Season:   s_t = γ y_t / L_t + (1 - γ) s_{t-m}
//! Forecast: F_{t+h} = (L_t + h T_t) s_{t+h-m}
//! ```
//!
//! Additive mode replaces the ratios with differences. With fewer than two full
//! seasons of data the seasonal terms cannot be initialized and the model falls
//! back to Holt's linear method (level + trend only).

use crate::domain::SeasonalityMode;
use crate::error::AppError;

/// Smoothing constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoltWintersParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Observations per seasonal cycle.
    pub season_length: usize,
}

impl Default for HoltWintersParams {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.1,
            season_length: 12,
        }
    }
}

impl HoltWintersParams {
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, v) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !(v.is_finite() && v > 0.0 && v < 1.0) {
                return Err(AppError::config(format!("Holt-Winters {name} must be in (0, 1), got {v}.")));
            }
        }
        if self.season_length < 2 {
            return Err(AppError::config("Holt-Winters season length must be >= 2."));
        }
        Ok(())
    }
}

/// Smoothed state after consuming the training values.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltWintersModel {
    pub mode: SeasonalityMode,
    pub params: HoltWintersParams,
    /// Whether seasonal terms are active (enough data for two seasons).
    pub seasonal: bool,
    pub level: f64,
    pub trend: f64,
    /// Seasonal indices, addressed by `time_index % season_length`.
    pub seasonals: Vec<f64>,
    /// One-step-ahead fitted values for each training index.
    pub fitted: Vec<f64>,
    /// Level + trend component behind each fitted value.
    pub fitted_trend: Vec<f64>,
}

impl HoltWintersModel {
    /// Run the smoother over `values`.
    pub fn fit(values: &[f64], mode: SeasonalityMode, params: HoltWintersParams) -> Result<Self, AppError> {
        params.validate()?;
        if values.is_empty() {
            return Err(AppError::model("Cannot fit Holt-Winters on an empty training series."));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::model("Holt-Winters input contains non-finite values."));
        }

        let m = params.season_length;
        if values.len() >= 2 * m {
            if mode == SeasonalityMode::Multiplicative && values.iter().any(|&v| v <= 0.0) {
                return Err(AppError::model(
                    "Multiplicative Holt-Winters requires strictly positive values.",
                ));
            }
            Ok(Self::fit_seasonal(values, mode, params))
        } else {
            Ok(Self::fit_linear(values, mode, params))
        }
    }

    fn fit_linear(values: &[f64], mode: SeasonalityMode, params: HoltWintersParams) -> Self {
        let n = values.len();
        let mut level = values[0];
        let mut trend = if n >= 2 { values[1] - values[0] } else { 0.0 };

        let mut fitted = Vec::with_capacity(n);
        let mut fitted_trend = Vec::with_capacity(n);
        // No forecast exists for the first observation; it fits itself.
        fitted.push(level);
        fitted_trend.push(level);

        for &y in &values[1..] {
            let forecast = level + trend;
            fitted.push(forecast);
            fitted_trend.push(forecast);

            let prev = level;
            level = params.alpha * y + (1.0 - params.alpha) * (level + trend);
            trend = params.beta * (level - prev) + (1.0 - params.beta) * trend;
        }

        Self {
            mode,
            params,
            seasonal: false,
            level,
            trend,
            seasonals: Vec::new(),
            fitted,
            fitted_trend,
        }
    }

    fn fit_seasonal(values: &[f64], mode: SeasonalityMode, params: HoltWintersParams) -> Self {
        let m = params.season_length;
        let mf = m as f64;
        let n = values.len();

        let mean1 = values[..m].iter().sum::<f64>() / mf;
        let mean2 = values[m..2 * m].iter().sum::<f64>() / mf;
        let mut trend = (mean2 - mean1) / mf;

        // `mean1` is the level at the middle of the first season.
        let mid = (mf - 1.0) / 2.0;
        let mut seasonals: Vec<f64> = (0..m)
            .map(|i| {
                let base = mean1 + trend * (i as f64 - mid);
                match mode {
                    SeasonalityMode::Multiplicative => values[i] / base,
                    SeasonalityMode::Additive => values[i] - base,
                }
            })
            .collect();
        // Level just before the first observation.
        let mut level = mean1 - trend * (mid + 1.0);

        let mut fitted = Vec::with_capacity(n);
        let mut fitted_trend = Vec::with_capacity(n);

        for (t, &y) in values.iter().enumerate() {
            let s = seasonals[t % m];
            let base = level + trend;
            fitted.push(apply(mode, base, s));
            fitted_trend.push(base);

            let prev = level;
            level = match mode {
                SeasonalityMode::Multiplicative => params.alpha * (y / s) + (1.0 - params.alpha) * base,
                SeasonalityMode::Additive => params.alpha * (y - s) + (1.0 - params.alpha) * base,
            };
            trend = params.beta * (level - prev) + (1.0 - params.beta) * trend;
            seasonals[t % m] = match mode {
                SeasonalityMode::Multiplicative => params.gamma * (y / level) + (1.0 - params.gamma) * s,
                SeasonalityMode::Additive => params.gamma * (y - level) + (1.0 - params.gamma) * s,
            };
        }

        Self {
            mode,
            params,
            seasonal: true,
            level,
            trend,
            seasonals,
            fitted,
            fitted_trend,
        }
    }

    pub fn n_train(&self) -> usize {
        self.fitted.len()
    }

    /// `(yhat, trend)` at `h >= 1` steps past the last training value.
    pub fn forecast(&self, h: usize) -> (f64, f64) {
        let base = self.level + h as f64 * self.trend;
        if !self.seasonal {
            return (base, base);
        }
        let idx = (self.n_train() - 1 + h) % self.params.season_length;
        (apply(self.mode, base, self.seasonals[idx]), base)
    }

    /// One-step-ahead `(yhat, trend)` for training observation `k`.
    pub fn fitted_at(&self, k: usize) -> Option<(f64, f64)> {
        Some((*self.fitted.get(k)?, *self.fitted_trend.get(k)?))
    }
}

fn apply(mode: SeasonalityMode, base: f64, s: f64) -> f64 {
    match mode {
        SeasonalityMode::Multiplicative => base * s,
        SeasonalityMode::Additive => base + s,
    }
}
