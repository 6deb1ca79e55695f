//! Alternative backend: Holt–Winters exponential smoothing.
//!
//! Historic horizon dates receive the one-step-ahead fitted value of the
//! matching training observation. Dates after the training window receive
//! h-step forecasts, with h counted in periods from the last training date.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{ForecastConfig, ForecastPoint, ForecastResult, Frequency, Horizon, TimeSeries};
use crate::error::AppError;
use crate::forecast::{Forecaster, check_cadence};
use crate::models::{HoltWintersModel, HoltWintersParams};

#[derive(Debug, Clone)]
pub struct HoltWintersForecaster {
    config: ForecastConfig,
    params: HoltWintersParams,
}

/// Smoother state plus the training dates it was run over.
///
/// `dates[k]` is the date of `model.fitted[k]`. Gaps in the calendar do not
/// shift the mapping.
#[derive(Debug, Clone)]
pub struct AnchoredHoltWinters {
    pub dates: Vec<NaiveDate>,
    pub model: HoltWintersModel,
}

impl AnchoredHoltWinters {
    /// `(yhat, trend)` for `date`.
    fn value_for(&self, date: NaiveDate, frequency: Frequency) -> Result<(f64, f64), AppError> {
        let (Some(&first), Some(&last)) = (self.dates.first(), self.dates.last()) else {
            return Err(AppError::model("Holt-Winters model has no training dates."));
        };
        if date < first {
            return Err(AppError::model(format!(
                "Cannot predict {date}: before the first training date {first}."
            )));
        }
        if date <= last {
            return self
                .dates
                .binary_search(&date)
                .ok()
                .and_then(|k| self.model.fitted_at(k))
                .ok_or_else(|| {
                    AppError::model(format!(
                        "Cannot predict {date}: inside the training range but not a training date."
                    ))
                });
        }

        let h = frequency.period_index(last, date);
        let h = usize::try_from(h)
            .ok()
            .filter(|&h| h >= 1)
            .ok_or_else(|| {
                AppError::model(format!(
                    "Cannot predict {date}: falls in the same period as the last training date {last}."
                ))
            })?;
        Ok(self.model.forecast(h))
    }
}

impl HoltWintersForecaster {
    pub fn new(config: ForecastConfig) -> Result<Self, AppError> {
        config.validate()?;
        let params = HoltWintersParams {
            season_length: config.frequency.periods_per_year(),
            ..HoltWintersParams::default()
        };
        params.validate()?;
        Ok(Self { config, params })
    }
}

impl Forecaster for HoltWintersForecaster {
    type Model = AnchoredHoltWinters;

    fn name(&self) -> &'static str {
        "holt-winters"
    }

    fn fit(&self, train: &TimeSeries) -> Result<AnchoredHoltWinters, AppError> {
        if train.is_empty() {
            return Err(AppError::model("Cannot fit on an empty training series."));
        }
        check_cadence(train, self.config.frequency)?;

        let model = HoltWintersModel::fit(&train.values(), self.config.seasonality_mode, self.params)?;
        info!(
            backend = self.name(),
            seasonal = model.seasonal,
            level = model.level,
            trend = model.trend,
            "model trained"
        );
        Ok(AnchoredHoltWinters {
            dates: train.dates().collect(),
            model,
        })
    }

    fn predict(&self, model: &AnchoredHoltWinters, horizon: &Horizon) -> Result<ForecastResult, AppError> {
        let mut points = Vec::with_capacity(horizon.len());
        for &date in horizon.dates() {
            let (yhat, trend) = model.value_for(date, self.config.frequency)?;
            if !yhat.is_finite() {
                return Err(AppError::model(format!("Non-finite prediction for {date}.")));
            }
            points.push(ForecastPoint {
                date,
                yhat,
                trend,
                seasonal: yhat - trend,
            });
        }

        Ok(ForecastResult {
            backend: self.name().to_string(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use crate::error::ErrorKind;

    fn budget(n: usize) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2019, 1, 31).unwrap();
        let points = (0..n)
            .map(|i| {
                let date = Frequency::MonthEnd.step(start, i as u32).unwrap();
                let season = 1.0 + 0.1 * (i as f64 * std::f64::consts::PI / 6.0).sin();
                Observation::new(date, (200.0 + 3.0 * i as f64) * season)
            })
            .collect();
        TimeSeries::new(points).unwrap()
    }

    #[test]
    fn covers_historic_and_future_dates() {
        let all = budget(40);
        let split = crate::data::split_series(&all, 0.85).unwrap();
        let horizon = Horizon::from_split(&split).unwrap();

        let f = HoltWintersForecaster::new(ForecastConfig::default()).unwrap();
        let model = f.fit(&split.train).unwrap();
        assert!(model.model.seasonal);

        let result = f.predict(&model, &horizon).unwrap();
        assert_eq!(result.len(), 40);
        assert_eq!(result.backend, "holt-winters");
        assert_eq!(result.points[5].yhat, model.model.fitted[5]);
    }

    #[test]
    fn date_before_training_is_a_model_error() {
        let train = budget(24);
        let f = HoltWintersForecaster::new(ForecastConfig::default()).unwrap();
        let model = f.fit(&train).unwrap();
        let horizon = Horizon::new(vec![NaiveDate::from_ymd_opt(2018, 12, 31).unwrap()]).unwrap();
        assert_eq!(f.predict(&model, &horizon).unwrap_err().kind(), ErrorKind::Model);
    }

    /// 30 month-end rows starting 2019-01 with 2020-03 left out.
    fn budget_with_gap() -> TimeSeries {
        let gap = NaiveDate::from_ymd_opt(2020, 3, 31).unwrap();
        let points = budget(31).points().iter().copied().filter(|o| o.date != gap).collect();
        TimeSeries::new(points).unwrap()
    }

    #[test]
    fn gap_keeps_fitted_values_on_their_dates() {
        let train = budget_with_gap();
        assert_eq!(train.len(), 30);
        let f = HoltWintersForecaster::new(ForecastConfig::default()).unwrap();
        let model = f.fit(&train).unwrap();

        let horizon = Horizon::new(train.dates().collect()).unwrap();
        let result = f.predict(&model, &horizon).unwrap();
        for (k, point) in result.points.iter().enumerate() {
            assert_eq!(point.yhat, model.model.fitted[k], "date {}", point.date);
        }
    }

    #[test]
    fn gap_counts_future_steps_from_last_training_date() {
        let train = budget_with_gap();
        let f = HoltWintersForecaster::new(ForecastConfig::default()).unwrap();
        let model = f.fit(&train).unwrap();

        let last = train.last().unwrap().date;
        let dates = vec![
            Frequency::MonthEnd.step(last, 1).unwrap(),
            Frequency::MonthEnd.step(last, 3).unwrap(),
        ];
        let result = f.predict(&model, &Horizon::new(dates).unwrap()).unwrap();
        assert_eq!(result.points[0].yhat, model.model.forecast(1).0);
        assert_eq!(result.points[1].yhat, model.model.forecast(3).0);
    }

    #[test]
    fn missing_training_date_is_a_model_error() {
        let train = budget_with_gap();
        let f = HoltWintersForecaster::new(ForecastConfig::default()).unwrap();
        let model = f.fit(&train).unwrap();
        let horizon = Horizon::new(vec![NaiveDate::from_ymd_opt(2020, 3, 31).unwrap()]).unwrap();
        assert_eq!(f.predict(&model, &horizon).unwrap_err().kind(), ErrorKind::Model);
    }
}
