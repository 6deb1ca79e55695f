//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments into domain configs
//! - runs the forecast pipeline
//! - prints the summary and writes optional exports
//! - renders the chart last, so a display failure never hides a finished forecast

use std::io::IsTerminal;
use std::path::Path;

use clap::Parser;
use tracing::{error, info};

use crate::cli::{Command, ForecastArgs, PlotArgs, SampleArgs};
use crate::data::{generate_sample, write_series_csv};
use crate::domain::{ColumnMap, ForecastConfig, PlotMode, RunConfig, RunOutput, SampleConfig};
use crate::error::AppError;
use crate::io::{RunBundle, read_run_json, write_forecast_csv, write_run_json};
use crate::plot::{ChartData, render_ascii_chart, write_svg_chart};
use crate::report::{format_metrics, format_run_summary, format_test_table};

pub mod pipeline;

/// Entry point for the `budget-forecast` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Forecast(args) => handle_forecast(&args),
        Command::Sample(args) => handle_sample(&args),
        Command::Plot(args) => handle_plot(&args),
    }
}

fn handle_forecast(args: &ForecastArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args)?;
    let run = pipeline::run_forecast(&config)?;

    println!("{}", format_run_summary(&run, &config));
    if !run.split.test.is_empty() {
        println!("{}", format_test_table(&run));
    }

    if let Some(path) = &config.export_csv {
        write_forecast_csv(path, &run.split, &run.forecast)?;
    }
    if let Some(path) = &config.export_json {
        write_run_json(path, &RunBundle::new(&config.input, run.clone()))?;
    }

    render_run(
        &run,
        &RenderTarget {
            mode: config.plot,
            svg: config.output.as_deref(),
            width: config.plot_width,
            height: config.plot_height,
        },
    )
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(args);
    let columns = ColumnMap {
        date: args.date_column.clone(),
        value: args.value_column.clone(),
    };

    let series = generate_sample(&config)?;
    write_series_csv(&args.output, &series, &columns)?;
    println!("Wrote {} rows to {}", series.len(), args.output.display());
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let bundle = read_run_json(&args.run)?;
    info!(run = %args.run.display(), input = %bundle.input, backend = %bundle.run.forecast.backend, "loaded run bundle");
    print!("{}", format_metrics(bundle.run.metrics.as_ref()));

    render_run(
        &bundle.run,
        &RenderTarget {
            mode: args.plot,
            svg: args.output.as_deref(),
            width: args.width,
            height: args.height,
        },
    )
}

struct RenderTarget<'a> {
    mode: PlotMode,
    svg: Option<&'a Path>,
    width: usize,
    height: usize,
}

/// Draw the run on every requested surface; failures are logged and returned.
fn render_run(run: &RunOutput, target: &RenderTarget<'_>) -> Result<(), AppError> {
    let result = draw(run, target);
    if let Err(err) = &result {
        error!(error = %err, "rendering failed");
    }
    result
}

fn draw(run: &RunOutput, target: &RenderTarget<'_>) -> Result<(), AppError> {
    let data = ChartData::from_run(run)?;
    if let Some(path) = target.svg {
        write_svg_chart(path, &data)?;
    }

    match resolve_plot_mode(target.mode, std::io::stdout().is_terminal()) {
        PlotMode::Tui => crate::tui::show(run),
        PlotMode::Ascii => {
            println!("{}", render_ascii_chart(&data, target.width, target.height));
            Ok(())
        }
        PlotMode::None | PlotMode::Auto => Ok(()),
    }
}

/// `auto` opens the terminal chart only when stdout is interactive.
fn resolve_plot_mode(mode: PlotMode, interactive: bool) -> PlotMode {
    match mode {
        PlotMode::Auto if interactive => PlotMode::Tui,
        PlotMode::Auto => PlotMode::Ascii,
        other => other,
    }
}

pub fn run_config_from_args(args: &ForecastArgs) -> Result<RunConfig, AppError> {
    if !(args.split.is_finite() && args.split > 0.0 && args.split < 1.0) {
        return Err(AppError::config(format!(
            "Invalid split fraction {} (must be in (0, 1)).",
            args.split
        )));
    }
    if args.width == 0 || args.height == 0 {
        return Err(AppError::config("Plot width and height must be > 0."));
    }

    let forecast = ForecastConfig {
        seasonality_mode: args.seasonality_mode,
        frequency: args.freq,
        seed: args.seed,
        yearly_order: args.yearly_order,
        n_changepoints: args.changepoints,
        changepoint_range: args.changepoint_range,
        trend_reg: args.trend_reg,
        seasonality_reg: args.seasonality_reg,
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        batch_size: args.batch_size,
        ..ForecastConfig::default()
    };
    forecast.validate()?;

    Ok(RunConfig {
        input: args.input.clone(),
        columns: ColumnMap {
            date: args.date_column.clone(),
            value: args.value_column.clone(),
        },
        split_fraction: args.split,
        backend: args.backend,
        forecast,
        future_periods: args.periods,
        plot: args.plot,
        output: args.output.clone(),
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export_csv.clone(),
        export_json: args.export_json.clone(),
    })
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        months: args.months,
        start: args.start,
        frequency: args.freq,
        base: args.base,
        growth: args.growth,
        seasonal_amplitude: args.seasonal_amplitude,
        noise: args.noise,
        seed: args.seed,
    }
}

/// Rewrite argv so `budget-forecast` defaults to `budget-forecast forecast`.
///
/// Rules:
/// - `budget-forecast`                     -> `budget-forecast forecast`
/// - `budget-forecast --seed 7 ...`        -> `budget-forecast forecast --seed 7 ...`
/// - `budget-forecast --help/--version/-h` -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("forecast".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(arg1.as_str(), "forecast" | "sample" | "plot");
    if is_top_level_help_or_version || is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "forecast".to_string());
    }
    argv
}
