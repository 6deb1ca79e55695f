//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::calendar::{month_end, month_start, months_between};
use crate::error::AppError;

/// How the seasonal component combines with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// `y = trend * (1 + season)`: seasonal swings scale with the level.
    Multiplicative,
    /// `y = trend + season`.
    Additive,
}

/// Sampling frequency of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    /// One observation per month, stamped on the last day of the month.
    MonthEnd,
    /// One observation per month, stamped on the first day of the month.
    MonthStart,
}

impl Frequency {
    /// Short code (pandas-style offset alias).
    pub fn code(self) -> &'static str {
        match self {
            Frequency::MonthEnd => "ME",
            Frequency::MonthStart => "MS",
        }
    }

    /// Inclusive range of day gaps considered consistent with this frequency.
    pub fn cadence_days(self) -> (i64, i64) {
        match self {
            Frequency::MonthEnd | Frequency::MonthStart => (26, 33),
        }
    }

    /// Observations per seasonal cycle (one year).
    pub fn periods_per_year(self) -> usize {
        match self {
            Frequency::MonthEnd | Frequency::MonthStart => 12,
        }
    }

    /// The date `n` periods after `date`, anchored per this frequency.
    pub fn step(self, date: NaiveDate, n: u32) -> Option<NaiveDate> {
        let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(n);
        let year = i32::try_from(total.div_euclid(12)).ok()?;
        let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
        match self {
            Frequency::MonthEnd => month_end(year, month),
            Frequency::MonthStart => month_start(year, month),
        }
    }

    /// Period index of `date` relative to `origin` (0 for the origin's period).
    pub fn period_index(self, origin: NaiveDate, date: NaiveDate) -> i64 {
        match self {
            Frequency::MonthEnd | Frequency::MonthStart => months_between(origin, date),
        }
    }
}

/// Which forecasting backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Piecewise-linear trend + Fourier seasonality with seeded refinement.
    Seasonal,
    /// Triple exponential smoothing.
    HoltWinters,
}

impl Backend {
    pub fn display_name(self) -> &'static str {
        match self {
            Backend::Seasonal => "Seasonal regression",
            Backend::HoltWinters => "Holt-Winters",
        }
    }
}

/// Where the comparison chart goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlotMode {
    /// Interactive terminal chart if stdout is a terminal, else ASCII.
    Auto,
    /// Interactive terminal chart.
    Tui,
    /// Plain text chart on stdout.
    Ascii,
    /// No chart.
    None,
}

/// Names of the two input columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: String,
    pub value: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            value: "Budget".to_string(),
        }
    }
}

/// A single dated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An ordered series with strictly increasing dates and finite values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Observation>", into = "Vec<Observation>")]
pub struct TimeSeries {
    points: Vec<Observation>,
}

impl TimeSeries {
    /// Build a series, rejecting unordered/duplicate dates and non-finite values.
    pub fn new(points: Vec<Observation>) -> Result<Self, AppError> {
        for obs in &points {
            if !obs.value.is_finite() {
                return Err(AppError::data(format!("Non-finite value on {}.", obs.date)));
            }
        }
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(AppError::data(format!(
                    "Dates must be strictly increasing: {} follows {}.",
                    pair[1].date, pair[0].date
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }

    /// Contiguous sub-series. Ordering is inherited, so no re-validation is needed.
    pub(crate) fn slice(&self, range: std::ops::Range<usize>) -> TimeSeries {
        TimeSeries {
            points: self.points[range].to_vec(),
        }
    }
}

impl TryFrom<Vec<Observation>> for TimeSeries {
    type Error = AppError;

    fn try_from(points: Vec<Observation>) -> Result<Self, Self::Error> {
        TimeSeries::new(points)
    }
}

impl From<TimeSeries> for Vec<Observation> {
    fn from(series: TimeSeries) -> Self {
        series.points
    }
}

/// Chronological train/test partition of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub train: TimeSeries,
    pub test: TimeSeries,
}

impl Split {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dates for which predictions are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horizon {
    dates: Vec<NaiveDate>,
}

impl Horizon {
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, AppError> {
        if dates.is_empty() {
            return Err(AppError::model("Prediction horizon is empty."));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::model(
                "Prediction horizon dates must be strictly increasing.",
            ));
        }
        Ok(Self { dates })
    }

    /// Historic + held-out dates: every training date followed by every test date.
    pub fn from_split(split: &Split) -> Result<Self, AppError> {
        let dates = split.train.dates().chain(split.test.dates()).collect();
        Self::new(dates)
    }

    /// Append `periods` dates after the last one, stepped at `frequency`.
    ///
    /// Every step lands in a later calendar month, so ordering is preserved.
    pub fn extend(mut self, periods: usize, frequency: Frequency) -> Result<Self, AppError> {
        let Some(&last) = self.dates.last() else {
            return Err(AppError::model("Prediction horizon is empty."));
        };
        for i in 1..=periods {
            let n = u32::try_from(i)
                .map_err(|_| AppError::config(format!("Too many future periods: {periods}")))?;
            let next = frequency
                .step(last, n)
                .ok_or_else(|| AppError::model(format!("Date overflow extending horizon from {last}.")))?;
            self.dates.push(next);
        }
        Ok(self)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// One predicted point with its decomposition (all in value units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub trend: f64,
    pub seasonal: f64,
}

/// Predictions over a horizon, one per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub backend: String,
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.yhat).collect()
    }

    /// Prediction for `date`, if it is part of the horizon.
    pub fn get(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points
            .binary_search_by(|p| p.date.cmp(&date))
            .ok()
            .map(|i| &self.points[i])
    }
}

/// Hold-out accuracy of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub n: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error (in %), over non-zero actuals only.
    pub mape: Option<f64>,
}

/// Everything one forecast run produces; consumed by reporting, exports and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub split: Split,
    pub forecast: ForecastResult,
    pub metrics: Option<ErrorMetrics>,
}

/// Forecaster settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub seasonality_mode: SeasonalityMode,
    pub frequency: Frequency,
    /// Seed for every random choice made while fitting.
    pub seed: u64,
    /// Fourier order of the yearly seasonality.
    pub yearly_order: usize,
    pub n_changepoints: usize,
    /// Fraction of the training history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Ridge penalty on changepoint slope deltas.
    pub trend_reg: f64,
    /// Ridge penalty on Fourier coefficients.
    pub seasonality_reg: f64,
    /// Iteration cap for the alternating trend/season solve.
    pub max_als_iters: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            seasonality_mode: SeasonalityMode::Multiplicative,
            frequency: Frequency::MonthEnd,
            seed: 42,
            yearly_order: 3,
            n_changepoints: 5,
            changepoint_range: 0.8,
            trend_reg: 1.0,
            seasonality_reg: 0.1,
            max_als_iters: 50,
            epochs: 50,
            learning_rate: 1e-3,
            batch_size: 16,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.changepoint_range.is_finite() && self.changepoint_range > 0.0 && self.changepoint_range <= 1.0)
        {
            return Err(AppError::config(format!(
                "Invalid changepoint range {} (must be in (0, 1]).",
                self.changepoint_range
            )));
        }
        if !(self.trend_reg.is_finite() && self.trend_reg >= 0.0) {
            return Err(AppError::config("Trend regularization must be finite and >= 0."));
        }
        if !(self.seasonality_reg.is_finite() && self.seasonality_reg >= 0.0) {
            return Err(AppError::config(
                "Seasonality regularization must be finite and >= 0.",
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AppError::config("Learning rate must be finite and > 0."));
        }
        if self.batch_size == 0 {
            return Err(AppError::config("Batch size must be > 0."));
        }
        if self.max_als_iters == 0 {
            return Err(AppError::config("Alternating solve iterations must be > 0."));
        }
        Ok(())
    }
}

/// Everything a `forecast` run needs, resolved from CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub columns: ColumnMap,
    pub split_fraction: f64,
    pub backend: Backend,
    pub forecast: ForecastConfig,
    /// Extra periods predicted past the end of the data.
    pub future_periods: usize,
    pub plot: PlotMode,
    pub output: Option<PathBuf>,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("budgetdata.csv"),
            columns: ColumnMap::default(),
            split_fraction: DEFAULT_SPLIT_FRACTION,
            backend: Backend::Seasonal,
            forecast: ForecastConfig::default(),
            future_periods: 0,
            plot: PlotMode::Auto,
            output: None,
            plot_width: 100,
            plot_height: 25,
            export_csv: None,
            export_json: None,
        }
    }
}

/// Chronological share of the series used for training.
pub const DEFAULT_SPLIT_FRACTION: f64 = 0.85;

/// Settings for the synthetic budget generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub months: usize,
    pub start: NaiveDate,
    pub frequency: Frequency,
    pub base: f64,
    /// Growth per year as a fraction of `base`.
    pub growth: f64,
    /// Peak-to-mean seasonal swing as a fraction of the level.
    pub seasonal_amplitude: f64,
    /// Noise standard deviation as a fraction of the level.
    pub noise: f64,
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let err = TimeSeries::new(vec![
            Observation::new(d(2024, 1, 31), 1.0),
            Observation::new(d(2024, 1, 31), 2.0),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
    }

    #[test]
    fn month_end_step_lands_on_last_day() {
        let f = Frequency::MonthEnd;
        assert_eq!(f.step(d(2024, 1, 31), 1), Some(d(2024, 2, 29)));
        assert_eq!(f.step(d(2023, 11, 30), 3), Some(d(2024, 2, 29)));
        assert_eq!(f.step(d(2024, 12, 31), 1), Some(d(2025, 1, 31)));
    }

    #[test]
    fn horizon_extend_appends_future_periods() {
        let h = Horizon::new(vec![d(2024, 1, 31), d(2024, 2, 29)])
            .unwrap()
            .extend(2, Frequency::MonthEnd)
            .unwrap();
        assert_eq!(h.dates(), &[d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30)]);
    }

    #[test]
    fn horizon_rejects_unordered_dates() {
        assert!(Horizon::new(vec![d(2024, 2, 29), d(2024, 1, 31)]).is_err());
        assert!(Horizon::new(vec![]).is_err());
    }

    #[test]
    fn forecast_lookup_by_date() {
        let result = ForecastResult {
            backend: "test".to_string(),
            points: vec![
                ForecastPoint { date: d(2024, 1, 31), yhat: 1.0, trend: 1.0, seasonal: 0.0 },
                ForecastPoint { date: d(2024, 2, 29), yhat: 2.0, trend: 2.0, seasonal: 0.0 },
            ],
        };
        assert_eq!(result.get(d(2024, 2, 29)).map(|p| p.yhat), Some(2.0));
        assert!(result.get(d(2024, 3, 31)).is_none());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ForecastConfig::default().validate().is_ok());
    }
}
