//! Basis functions for the trend and seasonal components.
//!
//! - Fourier terms: `cos(2π n t / P)`, `sin(2π n t / P)` for `n = 1..=order`
//! - Hinge terms: `max(0, t - c)` for a changepoint `c`

use std::f64::consts::PI;

/// Length of the yearly cycle in days.
pub const YEAR_DAYS: f64 = 365.25;

/// Fill `out` with `2 * order` Fourier features of `t_days` for period `period_days`.
///
/// Layout: `[cos(1), sin(1), cos(2), sin(2), ...]`.
///
/// # Panics
/// Panics if `out.len() < 2 * order`.
pub fn fourier_features(t_days: f64, period_days: f64, order: usize, out: &mut [f64]) {
    for n in 1..=order {
        let arg = 2.0 * PI * n as f64 * t_days / period_days;
        out[2 * (n - 1)] = arg.cos();
        out[2 * (n - 1) + 1] = arg.sin();
    }
}

/// `max(0, t - c)`.
pub fn hinge(t: f64, c: f64) -> f64 {
    (t - c).max(0.0)
}
