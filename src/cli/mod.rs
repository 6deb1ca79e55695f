//! Command-line parsing for the budget forecaster.
//!
//! Argument parsing and command dispatch stay separate from the modeling code:
//! these structs are converted into plain domain configs by `crate::app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Backend, DEFAULT_SPLIT_FRACTION, Frequency, PlotMode, SeasonalityMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "budget-forecast",
    version,
    about = "Forecast a monthly budget series and plot train, test, and forecast"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load, split, fit, forecast, and plot (the default command).
    Forecast(ForecastArgs),
    /// Write a synthetic monthly budget CSV.
    Sample(SampleArgs),
    /// Re-render a run bundle written by `forecast --export-json`.
    Plot(PlotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Input CSV with a date column and a numeric value column.
    #[arg(short, long, default_value = "budgetdata.csv")]
    pub input: PathBuf,

    /// Name of the date column.
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// Name of the value column.
    #[arg(long, default_value = "Budget")]
    pub value_column: String,

    /// Fraction of the series (chronological prefix) used for training.
    #[arg(long, default_value_t = DEFAULT_SPLIT_FRACTION)]
    pub split: f64,

    /// Forecasting backend.
    #[arg(long, value_enum, default_value_t = Backend::Seasonal)]
    pub backend: Backend,

    /// How seasonality combines with the trend.
    #[arg(long, value_enum, default_value_t = SeasonalityMode::Multiplicative)]
    pub seasonality_mode: SeasonalityMode,

    /// Sampling frequency of the series.
    #[arg(long, value_enum, default_value_t = Frequency::MonthEnd)]
    pub freq: Frequency,

    /// Random seed threaded into the forecaster.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fourier order of the yearly seasonality.
    #[arg(long, default_value_t = 3)]
    pub yearly_order: usize,

    /// Number of potential trend changepoints.
    #[arg(long, default_value_t = 5)]
    pub changepoints: usize,

    /// Share of the training history in which changepoints may be placed.
    #[arg(long, default_value_t = 0.8)]
    pub changepoint_range: f64,

    /// Ridge penalty on changepoint slope deltas.
    #[arg(long, default_value_t = 1.0)]
    pub trend_reg: f64,

    /// Ridge penalty on seasonal coefficients.
    #[arg(long, default_value_t = 0.1)]
    pub seasonality_reg: f64,

    /// Refinement epochs (0 disables refinement).
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Refinement learning rate.
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Refinement mini-batch size.
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Extra periods to forecast past the end of the data.
    #[arg(long, default_value_t = 0)]
    pub periods: usize,

    /// Where to draw the chart (auto: terminal window if interactive, else ASCII).
    #[arg(long, value_enum, default_value_t = PlotMode::Auto)]
    pub plot: PlotMode,

    /// Also write the chart to an SVG file.
    #[arg(short, long, value_name = "SVG")]
    pub output: Option<PathBuf>,

    /// ASCII plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// ASCII plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the forecast (with actuals) to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the run bundle to JSON (re-plot with `plot --run`).
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short, long, default_value = "budgetdata.csv")]
    pub output: PathBuf,

    /// Number of monthly rows.
    #[arg(long, default_value_t = 60)]
    pub months: usize,

    /// First period; snapped to the frequency's anchor day.
    #[arg(long, default_value = "2019-01-31")]
    pub start: NaiveDate,

    #[arg(long, value_enum, default_value_t = Frequency::MonthEnd)]
    pub freq: Frequency,

    /// Starting budget level.
    #[arg(long, default_value_t = 10_000.0)]
    pub base: f64,

    /// Growth per year as a fraction of the base level.
    #[arg(long, default_value_t = 0.05)]
    pub growth: f64,

    /// Seasonal swing as a fraction of the level.
    #[arg(long, default_value_t = 0.1)]
    pub seasonal_amplitude: f64,

    /// Noise standard deviation as a fraction of the level.
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Name of the date column.
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// Name of the value column.
    #[arg(long, default_value = "Budget")]
    pub value_column: String,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Run bundle produced by `forecast --export-json`.
    #[arg(long, value_name = "JSON")]
    pub run: PathBuf,

    #[arg(long, value_enum, default_value_t = PlotMode::Auto)]
    pub plot: PlotMode,

    /// Also write the chart to an SVG file.
    #[arg(short, long, value_name = "SVG")]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    pub width: usize,

    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_defaults() {
        let cli = Cli::try_parse_from(["budget-forecast", "forecast"]).unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.input, PathBuf::from("budgetdata.csv"));
        assert_eq!(args.date_column, "Date");
        assert_eq!(args.value_column, "Budget");
        assert_eq!(args.split, 0.85);
        assert_eq!(args.seasonality_mode, SeasonalityMode::Multiplicative);
        assert_eq!(args.freq, Frequency::MonthEnd);
        assert_eq!(args.seed, 42);
        assert_eq!(args.plot, PlotMode::Auto);
    }

    #[test]
    fn value_enums_use_kebab_case() {
        let cli = Cli::try_parse_from([
            "budget-forecast",
            "forecast",
            "--backend",
            "holt-winters",
            "--freq",
            "month-start",
            "--seasonality-mode",
            "additive",
            "--plot",
            "none",
        ])
        .unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.backend, Backend::HoltWinters);
        assert_eq!(args.freq, Frequency::MonthStart);
        assert_eq!(args.seasonality_mode, SeasonalityMode::Additive);
        assert_eq!(args.plot, PlotMode::None);
    }

    #[test]
    fn plot_requires_a_run_file() {
        assert!(Cli::try_parse_from(["budget-forecast", "plot"]).is_err());
    }
}
