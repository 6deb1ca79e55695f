//! Fitting routine for the seasonal regression model.
//!
//! Given a training series, we:
//! - scale values by their maximum magnitude
//! - build trend (piecewise linear) and seasonal (Fourier) design matrices
//! - solve for the coefficients with ridge least squares
//!   - additive: one joint solve
//!   - multiplicative: alternate trend and seasonal solves, each linear given
//!     the other, until the penalized objective stops improving
//! - hand the solution to the seeded gradient refinement stage
//!
//! Everything here is deterministic; the only randomness lives in
//! `fit::refine` and is driven by `ForecastConfig::seed`.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use crate::domain::{ForecastConfig, SeasonalityMode, TimeSeries};
use crate::error::AppError;
use crate::fit::changepoints::place_changepoints;
use crate::fit::refine::refine;
use crate::math::solve_ridge;
use crate::models::{SeasonalModel, combine, fill_season_row, fill_trend_row, season_len, trend_len};

/// Minimum training span (days) before yearly seasonality is estimated.
const MIN_SEASONAL_SPAN_DAYS: f64 = 365.0;

/// Relative objective improvement below which the alternating solve stops.
const ALS_TOL: f64 = 1e-10;

/// Design matrices and targets shared by the solver and the refinement stage.
#[derive(Debug, Clone)]
pub struct Design {
    pub mode: SeasonalityMode,
    /// Scaled targets.
    pub y: Vec<f64>,
    /// `n × trend_len` trend rows.
    pub trend: DMatrix<f64>,
    /// `n × season_len` seasonal rows (zero columns when seasonality is off).
    pub season: DMatrix<f64>,
    /// Ridge weight per trend coefficient.
    pub trend_penalty: Vec<f64>,
    /// Ridge weight per seasonal coefficient.
    pub season_penalty: Vec<f64>,
}

impl Design {
    pub fn n(&self) -> usize {
        self.y.len()
    }

    pub fn trend_at(&self, i: usize, coef: &[f64]) -> f64 {
        self.trend.row(i).iter().zip(coef).map(|(x, c)| x * c).sum()
    }

    pub fn season_at(&self, i: usize, coef: &[f64]) -> f64 {
        self.season.row(i).iter().zip(coef).map(|(x, c)| x * c).sum()
    }

    pub fn predict_at(&self, i: usize, trend_coef: &[f64], season_coef: &[f64]) -> f64 {
        combine(self.mode, self.trend_at(i, trend_coef), self.season_at(i, season_coef))
    }

    /// Penalized sum of squared residuals.
    pub fn objective(&self, trend_coef: &[f64], season_coef: &[f64]) -> f64 {
        let sse: f64 = (0..self.n())
            .map(|i| {
                let r = self.y[i] - self.predict_at(i, trend_coef, season_coef);
                r * r
            })
            .sum();
        sse + penalty(&self.trend_penalty, trend_coef) + penalty(&self.season_penalty, season_coef)
    }
}

fn penalty(weights: &[f64], coef: &[f64]) -> f64 {
    weights.iter().zip(coef).map(|(l, c)| l * c * c).sum()
}

/// Fit a [`SeasonalModel`] on `train`.
pub fn fit_seasonal(train: &TimeSeries, config: &ForecastConfig) -> Result<SeasonalModel, AppError> {
    config.validate()?;

    let (Some(first), Some(last)) = (train.first(), train.last()) else {
        return Err(AppError::model("Cannot fit on an empty training series."));
    };

    let origin = first.date;
    let span_days = ((last.date - origin).num_days() as f64).max(1.0);

    let values = train.values();
    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let y_scale = if max_abs > 0.0 { max_abs } else { 1.0 };

    let t_days: Vec<f64> = train.dates().map(|d| (d - origin).num_days() as f64).collect();
    let t: Vec<f64> = t_days.iter().map(|d| d / span_days).collect();

    let changepoints = place_changepoints(&t, config.n_changepoints, config.changepoint_range);
    let yearly_order = if span_days >= MIN_SEASONAL_SPAN_DAYS {
        config.yearly_order
    } else {
        0
    };

    let design = build_design(config, &t, &t_days, &values, y_scale, &changepoints, yearly_order);
    debug!(
        n = design.n(),
        changepoints = changepoints.len(),
        yearly_order,
        mode = ?config.seasonality_mode,
        "built design matrices"
    );

    let (trend_coef, season_coef) = match config.seasonality_mode {
        SeasonalityMode::Additive => solve_additive(&design)?,
        SeasonalityMode::Multiplicative => solve_multiplicative(&design, config.max_als_iters)?,
    };
    let initial_loss = design.objective(&trend_coef, &season_coef);

    let refined = refine(&design, trend_coef, season_coef, config);
    info!(
        initial_loss,
        refined_loss = refined.loss,
        improved = refined.loss < initial_loss,
        "fitted seasonal model"
    );

    if !refined.loss.is_finite()
        || refined.trend_coef.iter().chain(&refined.season_coef).any(|v| !v.is_finite())
    {
        return Err(AppError::model("Model fit produced non-finite parameters."));
    }

    Ok(SeasonalModel {
        mode: config.seasonality_mode,
        origin,
        span_days,
        y_scale,
        changepoints,
        yearly_order,
        trend_coef: refined.trend_coef,
        season_coef: refined.season_coef,
        training_loss: refined.loss,
    })
}

fn build_design(
    config: &ForecastConfig,
    t: &[f64],
    t_days: &[f64],
    values: &[f64],
    y_scale: f64,
    changepoints: &[f64],
    yearly_order: usize,
) -> Design {
    let n = t.len();
    let pt = trend_len(changepoints.len());
    let ps = season_len(yearly_order);

    let mut trend = DMatrix::<f64>::zeros(n, pt);
    let mut season = DMatrix::<f64>::zeros(n, ps);
    let mut trow = vec![0.0; pt];
    let mut srow = vec![0.0; ps];

    for i in 0..n {
        fill_trend_row(t[i], changepoints, &mut trow);
        fill_season_row(t_days[i], yearly_order, &mut srow);
        for j in 0..pt {
            trend[(i, j)] = trow[j];
        }
        for j in 0..ps {
            season[(i, j)] = srow[j];
        }
    }

    // Offset and base slope are free; only the slope changes are shrunk.
    let mut trend_penalty = vec![0.0; pt];
    for w in trend_penalty.iter_mut().skip(2) {
        *w = config.trend_reg;
    }
    let season_penalty = vec![config.seasonality_reg; ps];

    Design {
        mode: config.seasonality_mode,
        y: values.iter().map(|v| v / y_scale).collect(),
        trend,
        season,
        trend_penalty,
        season_penalty,
    }
}

fn solve_additive(design: &Design) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let n = design.n();
    let pt = design.trend.ncols();
    let ps = design.season.ncols();

    let mut x = DMatrix::<f64>::zeros(n, pt + ps);
    x.columns_mut(0, pt).copy_from(&design.trend);
    x.columns_mut(pt, ps).copy_from(&design.season);
    let y = DVector::from_column_slice(&design.y);

    let penalties: Vec<f64> = design.trend_penalty.iter().chain(&design.season_penalty).copied().collect();
    let beta = solve_ridge(&x, &y, &penalties)
        .ok_or_else(|| AppError::model("Least squares solve failed (singular design)."))?;

    Ok((beta.rows(0, pt).iter().copied().collect(), beta.rows(pt, ps).iter().copied().collect()))
}

fn solve_multiplicative(design: &Design, max_iters: usize) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let n = design.n();
    let pt = design.trend.ncols();
    let ps = design.season.ncols();
    let y = DVector::from_column_slice(&design.y);

    let mut trend_coef = vec![0.0; pt];
    let mut season_coef = vec![0.0; ps];
    let mut prev = f64::INFINITY;

    for iter in 0..max_iters {
        // Trend step: y ≈ (X_T β_T) (1 + S)  ->  rows X_T,i * (1 + S_i).
        let mut xt = design.trend.clone();
        for i in 0..n {
            let factor = 1.0 + design.season_at(i, &season_coef);
            xt.row_mut(i).scale_mut(factor);
        }
        let bt = solve_ridge(&xt, &y, &design.trend_penalty)
            .ok_or_else(|| AppError::model("Trend solve failed (singular design)."))?;
        trend_coef = bt.iter().copied().collect();

        if ps > 0 {
            // Seasonal step: y - T ≈ T (F β_S)  ->  rows T_i * F_i.
            let mut xs = design.season.clone();
            let mut target = DVector::<f64>::zeros(n);
            for i in 0..n {
                let trend_i = design.trend_at(i, &trend_coef);
                xs.row_mut(i).scale_mut(trend_i);
                target[i] = design.y[i] - trend_i;
            }
            let bs = solve_ridge(&xs, &target, &design.season_penalty)
                .ok_or_else(|| AppError::model("Seasonal solve failed (singular design)."))?;
            season_coef = bs.iter().copied().collect();
        } else {
            break;
        }

        let obj = design.objective(&trend_coef, &season_coef);
        if !obj.is_finite() {
            return Err(AppError::model("Alternating solve diverged (non-finite objective)."));
        }
        let improvement = prev - obj;
        prev = obj;
        if improvement.abs() <= ALS_TOL * (1.0 + obj) {
            debug!(iter, objective = obj, "alternating solve converged");
            break;
        }
    }

    Ok((trend_coef, season_coef))
}

/// Fitted values of `model` on its own training window, in original units.
pub fn in_sample_fit(model: &SeasonalModel, train: &TimeSeries) -> Vec<f64> {
    train.dates().map(|d| model.predict(d).yhat).collect()
}

/// Root mean squared error between `a` and `b`.
pub fn rmse(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sse: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (sse / n as f64).sqrt()
}
