//! Chart rendering shared by every output surface.
//!
//! [`ChartData`] turns a run into three x/y series on a decimal-year axis.
//! The surfaces (`ascii`, `svg`, and the terminal widget in `crate::tui`)
//! only draw what it holds.

use crate::domain::RunOutput;
use crate::domain::calendar::{decimal_year, from_decimal_year};
use crate::error::AppError;

pub mod ascii;
pub mod svg;

pub use ascii::render_ascii_chart;
pub use svg::write_svg_chart;

pub const CHART_TITLE: &str = "Monthly Budget Forecast";

pub const TRAIN_LABEL: &str = "Train";
pub const TEST_LABEL: &str = "Test";
pub const FORECAST_LABEL: &str = "Forecast";

/// Render-ready series and bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub train: Vec<(f64, f64)>,
    pub test: Vec<(f64, f64)>,
    pub forecast: Vec<(f64, f64)>,
    /// X bounds in decimal years.
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl ChartData {
    pub fn from_run(run: &RunOutput) -> Result<Self, AppError> {
        let to_xy = |date, value| (decimal_year(date), value);
        let train: Vec<_> = run.split.train.points().iter().map(|o| to_xy(o.date, o.value)).collect();
        let test: Vec<_> = run.split.test.points().iter().map(|o| to_xy(o.date, o.value)).collect();
        let forecast: Vec<_> = run.forecast.points.iter().map(|p| to_xy(p.date, p.yhat)).collect();

        let all = || train.iter().chain(&test).chain(&forecast);
        let (x_min, x_max) = min_max(all().map(|p| p.0))
            .ok_or_else(|| AppError::render("Nothing to plot: the run has no points."))?;
        let (y_min, y_max) = min_max(all().map(|p| p.1))
            .ok_or_else(|| AppError::render("Nothing to plot: the run has no points."))?;

        Ok(Self {
            x_bounds: pad_range(x_min, x_max, 0.0, 1.0 / 12.0),
            y_bounds: pad_range(y_min, y_max, 0.05, 1.0),
            train,
            test,
            forecast,
        })
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Pad a range by `frac` of its span, or by `fallback` on each side when it is
/// degenerate.
fn pad_range(min: f64, max: f64, frac: f64, fallback: f64) -> [f64; 2] {
    let span = max - min;
    if span <= 0.0 {
        return [min - fallback, max + fallback];
    }
    let pad = span * frac;
    [min - pad, max + pad]
}

/// Tick label for a decimal-year coordinate, e.g. `2024-03`.
pub fn fmt_year(x: f64) -> String {
    match from_decimal_year(x) {
        Some(date) => date.format("%Y-%m").to_string(),
        None => format!("{x:.2}"),
    }
}

/// Compact tick label for a budget value.
pub fn fmt_value(y: f64) -> String {
    let a = y.abs();
    if a >= 1e9 {
        format!("{:.1}B", y / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", y / 1e6)
    } else if a >= 1e4 {
        format!("{:.1}k", y / 1e3)
    } else {
        format!("{y:.1}")
    }
}
