//! Default backend: piecewise-linear trend with yearly Fourier seasonality.

use tracing::{debug, info};

use crate::domain::{ForecastConfig, ForecastResult, Horizon, TimeSeries};
use crate::error::AppError;
use crate::fit::{fit_seasonal, in_sample_fit, rmse};
use crate::forecast::{Forecaster, check_cadence};
use crate::models::SeasonalModel;

/// Seasonal regression forecaster.
#[derive(Debug, Clone)]
pub struct SeasonalForecaster {
    config: ForecastConfig,
}

impl SeasonalForecaster {
    pub fn new(config: ForecastConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }
}

impl Forecaster for SeasonalForecaster {
    type Model = SeasonalModel;

    fn name(&self) -> &'static str {
        "seasonal"
    }

    fn fit(&self, train: &TimeSeries) -> Result<SeasonalModel, AppError> {
        check_cadence(train, self.config.frequency)?;
        let model = fit_seasonal(train, &self.config)?;

        let in_sample = rmse(&in_sample_fit(&model, train), &train.values());
        info!(
            backend = self.name(),
            seed = self.config.seed,
            mode = ?self.config.seasonality_mode,
            freq = self.config.frequency.code(),
            changepoints = model.changepoints.len(),
            yearly_order = model.yearly_order,
            in_sample_rmse = in_sample,
            "model trained"
        );
        Ok(model)
    }

    fn predict(&self, model: &SeasonalModel, horizon: &Horizon) -> Result<ForecastResult, AppError> {
        let points: Vec<_> = horizon.dates().iter().map(|&d| model.predict(d)).collect();

        if let Some(bad) = points.iter().find(|p| !p.yhat.is_finite()) {
            return Err(AppError::model(format!("Non-finite prediction for {}.", bad.date)));
        }
        debug!(n = points.len(), "predicted horizon");

        Ok(ForecastResult {
            backend: self.name().to_string(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Frequency, Observation};

    fn budget(n: usize) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        let points = (0..n)
            .map(|i| {
                let date = Frequency::MonthEnd.step(start, i as u32).unwrap();
                Observation::new(date, 100.0 + 2.0 * i as f64)
            })
            .collect();
        TimeSeries::new(points).unwrap()
    }

    #[test]
    fn fit_predict_is_deterministic() {
        let train = budget(20);
        let horizon = Horizon::new(budget(24).dates().collect()).unwrap();
        let f = SeasonalForecaster::new(ForecastConfig::default()).unwrap();

        let a = f.predict(&f.fit(&train).unwrap(), &horizon).unwrap();
        let b = f.predict(&f.fit(&train).unwrap(), &horizon).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn one_prediction_per_horizon_date() {
        let train = budget(20);
        let horizon = Horizon::new(budget(24).dates().collect())
            .unwrap()
            .extend(6, Frequency::MonthEnd)
            .unwrap();
        let f = SeasonalForecaster::new(ForecastConfig::default()).unwrap();
        let result = f.predict(&f.fit(&train).unwrap(), &horizon).unwrap();

        assert_eq!(result.len(), 30);
        let dates: Vec<NaiveDate> = result.dates().collect();
        assert_eq!(dates.as_slice(), horizon.dates());
    }

    #[test]
    fn trend_continues_into_the_test_range() {
        let train = budget(20);
        let horizon = Horizon::new(budget(24).dates().collect()).unwrap();
        let f = SeasonalForecaster::new(ForecastConfig::default()).unwrap();
        let result = f.predict(&f.fit(&train).unwrap(), &horizon).unwrap();

        // Actual test values are 140, 142, 144, 146.
        let tail: Vec<f64> = result.values()[20..].to_vec();
        for (i, v) in tail.iter().enumerate() {
            let actual = 140.0 + 2.0 * i as f64;
            assert!((v - actual).abs() < 10.0, "month {i}: {v} vs {actual}");
        }
    }

    #[test]
    fn daily_data_fails_the_monthly_frequency() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let points = (0..10)
            .map(|i| Observation::new(start + chrono::Duration::days(i), 1.0))
            .collect();
        let train = TimeSeries::new(points).unwrap();
        let f = SeasonalForecaster::new(ForecastConfig::default()).unwrap();
        assert_eq!(f.fit(&train).unwrap_err().kind(), crate::error::ErrorKind::Model);
    }
}
