//! Synthetic monthly budget generation.
//!
//! Produces a series with linear growth, multiplicative yearly seasonality and
//! Gaussian noise. Useful for demos (`budget-forecast sample`) and for tests
//! that need realistic input without shipping data files.

use std::f64::consts::PI;
use std::fs::File;
use std::path::Path;

use chrono::Datelike;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::info;

use crate::domain::{ColumnMap, Observation, SampleConfig, TimeSeries};
use crate::error::AppError;

/// Generate a synthetic budget series.
pub fn generate_sample(config: &SampleConfig) -> Result<TimeSeries, AppError> {
    if config.months == 0 {
        return Err(AppError::config("Sample length must be > 0 months."));
    }
    if !(config.base.is_finite() && config.base > 0.0) {
        return Err(AppError::config("Sample base level must be finite and > 0."));
    }
    if !(config.seasonal_amplitude.is_finite() && (0.0..1.0).contains(&config.seasonal_amplitude)) {
        return Err(AppError::config("Seasonal amplitude must be in [0, 1)."));
    }
    if !(config.growth.is_finite() && config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::config("Growth and noise must be finite (noise >= 0)."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;

    // Re-anchor the start date on the frequency (e.g. month end).
    let start = config
        .frequency
        .step(config.start, 0)
        .ok_or_else(|| AppError::config(format!("Invalid sample start date {}.", config.start)))?;

    let mut points = Vec::with_capacity(config.months);
    for i in 0..config.months {
        let step = u32::try_from(i).map_err(|_| AppError::config("Sample too long."))?;
        let date = config
            .frequency
            .step(start, step)
            .ok_or_else(|| AppError::config("Date overflow while generating sample."))?;

        let years = i as f64 / config.frequency.periods_per_year() as f64;
        let level = config.base * (1.0 + config.growth * years);
        // Peak in December, trough in June.
        let phase = 2.0 * PI * f64::from(date.month0() + 1) / 12.0;
        let season = config.seasonal_amplitude * phase.cos();
        let noise = config.noise * normal.sample(&mut rng);

        let value = level * (1.0 + season) * (1.0 + noise);
        points.push(Observation::new(date, (value * 100.0).round() / 100.0));
    }

    TimeSeries::new(points)
}

/// Write a series as a two-column CSV using the given column names.
pub fn write_series_csv(path: &Path, series: &TimeSeries, columns: &ColumnMap) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record([columns.date.as_str(), columns.value.as_str()])
        .map_err(|e| AppError::config(format!("Failed to write sample CSV header: {e}")))?;
    for obs in series.points() {
        writer
            .write_record([obs.date.to_string(), format!("{:.2}", obs.value)])
            .map_err(|e| AppError::config(format!("Failed to write sample CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to flush sample CSV: {e}")))?;

    info!(path = %path.display(), rows = series.len(), "wrote sample series");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Frequency;

    fn config() -> SampleConfig {
        SampleConfig {
            months: 36,
            start: NaiveDate::from_ymd_opt(2021, 1, 15).unwrap(),
            frequency: Frequency::MonthEnd,
            base: 1000.0,
            growth: 0.05,
            seasonal_amplitude: 0.1,
            noise: 0.01,
            seed: 7,
        }
    }

    #[test]
    fn sample_is_deterministic_per_seed() {
        let a = generate_sample(&config()).unwrap();
        let b = generate_sample(&config()).unwrap();
        assert_eq!(a, b);

        let c = generate_sample(&SampleConfig { seed: 8, ..config() }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn sample_dates_are_month_ends() {
        let series = generate_sample(&config()).unwrap();
        assert_eq!(series.len(), 36);
        assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
        assert_eq!(series.last().unwrap().date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn written_sample_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.csv");
        let series = generate_sample(&config()).unwrap();
        write_series_csv(&path, &series, &ColumnMap::default()).unwrap();

        let loaded = crate::io::ingest::load_time_series(&path, &ColumnMap::default()).unwrap();
        assert_eq!(loaded.len(), series.len());
        for (a, b) in loaded.points().iter().zip(series.points()) {
            assert_eq!(a.date, b.date);
            assert!((a.value - b.value).abs() < 1e-9);
        }
    }

    #[test]
    fn unwritable_sample_path_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("budget.csv");
        let series = generate_sample(&config()).unwrap();
        let err = write_series_csv(&path, &series, &ColumnMap::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn zero_months_is_rejected() {
        assert!(generate_sample(&SampleConfig { months: 0, ..config() }).is_err());
    }
}
