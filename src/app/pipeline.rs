//! Shared forecast pipeline used by the `forecast` command.
//!
//! load -> split -> fit -> predict (train + test + future dates) -> metrics
//!
//! The pipeline is generic over [`Forecaster`]; the backend is picked once in
//! [`run_with_series`] and everything downstream only sees a [`RunOutput`].

use tracing::info;

use crate::data::split_series;
use crate::domain::{Backend, Horizon, RunConfig, RunOutput, TimeSeries};
use crate::error::AppError;
use crate::forecast::{Forecaster, HoltWintersForecaster, SeasonalForecaster};
use crate::io::load_time_series;
use crate::report::compute_metrics;

/// Load the configured input file and run the pipeline on it.
pub fn run_forecast(config: &RunConfig) -> Result<RunOutput, AppError> {
    let series = load_time_series(&config.input, &config.columns)?;
    run_with_series(&series, config)
}

/// Run the pipeline on an already loaded series with the configured backend.
pub fn run_with_series(series: &TimeSeries, config: &RunConfig) -> Result<RunOutput, AppError> {
    match config.backend {
        Backend::Seasonal => run_backend(&SeasonalForecaster::new(config.forecast.clone())?, series, config),
        Backend::HoltWinters => run_backend(&HoltWintersForecaster::new(config.forecast.clone())?, series, config),
    }
}

/// Run the pipeline with an explicit forecaster.
pub fn run_backend<F: Forecaster>(
    forecaster: &F,
    series: &TimeSeries,
    config: &RunConfig,
) -> Result<RunOutput, AppError> {
    let split = split_series(series, config.split_fraction)?;
    let model = forecaster.fit(&split.train)?;

    let horizon = Horizon::from_split(&split)?.extend(config.future_periods, config.forecast.frequency)?;
    let forecast = forecaster.predict(&model, &horizon)?;
    if forecast.len() != horizon.len() {
        return Err(AppError::model(format!(
            "Backend {} returned {} predictions for {} dates.",
            forecaster.name(),
            forecast.len(),
            horizon.len()
        )));
    }

    let metrics = compute_metrics(&split.test, &forecast);
    info!(
        backend = forecaster.name(),
        horizon = horizon.len(),
        mae = metrics.map(|m| m.mae),
        rmse = metrics.map(|m| m.rmse),
        "forecast complete"
    );

    Ok(RunOutput {
        split,
        forecast,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnMap, PlotMode};
    use crate::io::read_time_series;
    use crate::plot::{ChartData, render_ascii_chart, write_svg_chart};

    /// 24 month-end rows: 100, 102, 104, ...
    fn budget_csv() -> String {
        let mut csv = String::from("Date,Budget\n");
        let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 31).unwrap();
        for i in 0..24u32 {
            let date = crate::domain::Frequency::MonthEnd.step(start, i).unwrap();
            csv.push_str(&format!("{date},{}\n", 100 + 2 * i));
        }
        csv
    }

    fn config() -> RunConfig {
        RunConfig {
            plot: PlotMode::None,
            ..RunConfig::default()
        }
    }

    #[test]
    fn end_to_end_on_24_months() {
        let series = read_time_series(budget_csv().as_bytes(), &ColumnMap::default()).unwrap();
        let run = run_with_series(&series, &config()).unwrap();

        assert_eq!(run.split.train.len(), 20);
        assert_eq!(run.split.test.len(), 4);
        assert_eq!(run.forecast.len(), 24);
        let expected: Vec<_> = series.dates().collect();
        let got: Vec<_> = run.forecast.dates().collect();
        assert_eq!(got, expected);
        assert_eq!(run.metrics.map(|m| m.n), Some(4));

        let data = ChartData::from_run(&run).unwrap();
        let text = render_ascii_chart(&data, 60, 15);
        assert!(text.starts_with("Monthly Budget Forecast\n"));

        let dir = tempfile::tempdir().unwrap();
        write_svg_chart(&dir.path().join("chart.svg"), &data).unwrap();
    }

    #[test]
    fn holt_winters_honors_the_same_horizon_contract() {
        let series = read_time_series(budget_csv().as_bytes(), &ColumnMap::default()).unwrap();
        let config = RunConfig {
            backend: Backend::HoltWinters,
            ..config()
        };
        let run = run_with_series(&series, &config).unwrap();
        assert_eq!(run.forecast.len(), 24);
        assert_eq!(run.forecast.backend, "holt-winters");
    }

    #[test]
    fn future_periods_extend_the_forecast() {
        let series = read_time_series(budget_csv().as_bytes(), &ColumnMap::default()).unwrap();
        let config = RunConfig {
            future_periods: 6,
            ..config()
        };
        let run = run_with_series(&series, &config).unwrap();
        assert_eq!(run.forecast.len(), 30);
        let last = run.forecast.points.last().unwrap();
        assert_eq!(last.date, chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn month_start_series_runs_end_to_end() {
        let mut csv = String::from("Date,Budget\n");
        let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        for i in 0..24u32 {
            let date = crate::domain::Frequency::MonthStart.step(start, i).unwrap();
            csv.push_str(&format!("{date},{}\n", 100 + 2 * i));
        }
        let series = read_time_series(csv.as_bytes(), &ColumnMap::default()).unwrap();

        let mut config = RunConfig {
            future_periods: 3,
            ..config()
        };
        config.forecast.frequency = crate::domain::Frequency::MonthStart;
        for backend in [Backend::Seasonal, Backend::HoltWinters] {
            let run = run_with_series(&series, &RunConfig { backend, ..config.clone() }).unwrap();
            assert_eq!(run.forecast.len(), 27);
            assert_eq!(run.metrics.map(|m| m.n), Some(4));
            let future: Vec<_> = run.forecast.dates().skip(24).collect();
            assert_eq!(
                future,
                vec![
                    chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                    chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                ]
            );
        }
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let series = read_time_series(budget_csv().as_bytes(), &ColumnMap::default()).unwrap();
        let a = run_with_series(&series, &config()).unwrap();
        let b = run_with_series(&series, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_row_fails_in_fit() {
        let series = read_time_series("Date,Budget\n2024-01-31,5\n".as_bytes(), &ColumnMap::default()).unwrap();
        let err = run_with_series(&series, &config()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Model);
    }

    #[test]
    fn missing_input_file_is_a_data_error() {
        let config = RunConfig {
            input: "does/not/exist.csv".into(),
            ..config()
        };
        assert_eq!(run_forecast(&config).unwrap_err().kind(), crate::error::ErrorKind::Data);
    }
}
