//! Windowed LSTM forecasting in two passes
//!
//! The evaluation pass holds out the last `eval_holdout_months` of the
//! aggregate, rolls the model forward over that span and scores it with
//! MAPE. The production pass refits a fresh scaler and network on the whole
//! series and rolls forward `horizon` days. Both passes run the same
//! scale, window, train, roll out and invert sequence in
//! [`SequenceForecaster::train_and_roll`].

pub mod lstm;
pub mod window;

pub use lstm::LstmRegressor;
pub use window::{build_windows, rollout, NextStepPredictor, RollingWindow, SupervisedWindows};

use crate::config::SequenceConfig;
use crate::error::{ForecastError, Result};
use crate::features::{future_dates, DailyAggregate};
use crate::forecast::ForecastSeries;
use crate::split::split_months_before_end;
use chrono::NaiveDate;
use forecast_math::{mape_with_excluded, MinMaxScaler};

/// What one train-and-roll run produced
#[derive(Debug, Clone)]
pub struct PassOutcome {
    /// Scaler fitted on this pass's input series only
    pub scaler: MinMaxScaler,
    /// Rolled-out predictions in original units
    pub predictions: Vec<f64>,
    /// Mean training loss per epoch
    pub loss_history: Vec<f64>,
}

/// Evaluation pass result
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub cutoff: NaiveDate,
    /// Mean absolute percentage error in percent
    pub mape: f64,
    /// Predictions dated with the held-out test dates
    pub predictions: ForecastSeries,
    /// Actual sales on the test dates
    pub actual: Vec<f64>,
    pub loss_history: Vec<f64>,
}

/// Production pass result
#[derive(Debug, Clone)]
pub struct ProductionForecast {
    pub forecast: ForecastSeries,
    pub loss_history: Vec<f64>,
}

/// Both passes over the same aggregate
#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub evaluation: EvaluationReport,
    pub production: ProductionForecast,
}

/// LSTM forecaster over the daily sales series
#[derive(Debug, Clone)]
pub struct SequenceForecaster {
    config: SequenceConfig,
}

impl SequenceForecaster {
    pub fn new(config: SequenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Scale `series`, train a fresh network for `epochs` and roll out `horizon` values
    pub fn train_and_roll(
        &self,
        series: &[f64],
        horizon: usize,
        epochs: usize,
    ) -> Result<PassOutcome> {
        let window = self.config.window;
        if series.len() < window + 1 {
            return Err(ForecastError::InsufficientData(format!(
                "Sequence pass needs at least {} observations, got {}",
                window + 1,
                series.len()
            )));
        }

        let scaler = MinMaxScaler::fit(series)?;
        let scaled = scaler.transform(series);
        tracing::debug!(min = scaler.min(), max = scaler.max(), "scaled series");

        let windows = build_windows(&scaled, window)?;
        let mut model = LstmRegressor::new(&self.config);
        model.fit(&windows, epochs)?;
        tracing::debug!(windows = windows.len(), epochs, "trained sequence model");

        let seed = &scaled[scaled.len() - window..];
        let scaled_predictions = rollout(&model, seed, horizon)?;

        Ok(PassOutcome {
            predictions: scaler.inverse_transform(&scaled_predictions),
            scaler,
            loss_history: model.loss_history().to_vec(),
        })
    }

    /// Hold out the trailing months, forecast them and score with MAPE
    pub fn evaluate(&self, aggregate: &DailyAggregate) -> Result<EvaluationReport> {
        let split = split_months_before_end(aggregate, self.config.eval_holdout_months)?;
        let actual = split.test.sales();

        let outcome = self.train_and_roll(
            &split.train.sales(),
            split.test.len(),
            self.config.eval_epochs,
        )?;

        let (mape, excluded) = mape_with_excluded(&actual, &outcome.predictions)?;
        if excluded > 0 {
            tracing::warn!(excluded, "zero actual sales excluded from MAPE");
        }
        tracing::info!(mape, test_days = actual.len(), "sequence evaluation finished");

        Ok(EvaluationReport {
            cutoff: split.cutoff,
            mape,
            predictions: ForecastSeries::new(split.test.dates(), outcome.predictions)?,
            actual,
            loss_history: outcome.loss_history,
        })
    }

    /// Refit on the full series and forecast `horizon` days past its end
    pub fn forecast(&self, aggregate: &DailyAggregate) -> Result<ProductionForecast> {
        let last = aggregate.last_date().ok_or_else(|| {
            ForecastError::InsufficientData("Daily aggregate is empty".to_string())
        })?;

        let outcome = self.train_and_roll(
            &aggregate.sales(),
            self.config.horizon,
            self.config.production_epochs,
        )?;
        tracing::info!(horizon = self.config.horizon, "sequence forecast finished");

        Ok(ProductionForecast {
            forecast: ForecastSeries::new(
                future_dates(last, self.config.horizon),
                outcome.predictions,
            )?,
            loss_history: outcome.loss_history,
        })
    }

    /// Evaluation pass followed by the production pass
    pub fn run(&self, aggregate: &DailyAggregate) -> Result<SequenceReport> {
        let evaluation = self.evaluate(aggregate)?;
        let production = self.forecast(aggregate)?;
        Ok(SequenceReport {
            evaluation,
            production,
        })
    }
}
