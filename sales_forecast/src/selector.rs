//! Comparative training and selection of tabular regressors

use crate::config::SelectorConfig;
use crate::error::{ForecastError, Result};
use crate::features::{calendar_features, future_dates, DailyAggregate};
use crate::forecast::ForecastSeries;
use crate::models::{
    FittedRegressor, GradientBoosting, LinearRegression, RandomForest, TabularRegressor,
};
use crate::split::{chronological_split, cutoff_months_before, ChronologicalSplit};
use chrono::NaiveDate;
use forecast_math::root_mean_squared_error;
use std::collections::BTreeMap;

/// One scored model from a selection run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCandidate {
    pub name: String,
    pub test_predictions: Vec<f64>,
    pub rmse: f64,
}

/// Result of a selection run
#[derive(Debug)]
pub struct SelectionReport {
    split: ChronologicalSplit,
    candidates: Vec<ModelCandidate>,
    best_index: usize,
    best_model: Box<dyn FittedRegressor>,
    forecast: ForecastSeries,
}

impl SelectionReport {
    pub fn split(&self) -> &ChronologicalSplit {
        &self.split
    }

    /// Candidates in evaluation order
    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    pub fn rmse_by_model(&self) -> BTreeMap<String, f64> {
        self.candidates
            .iter()
            .map(|c| (c.name.clone(), c.rmse))
            .collect()
    }

    pub fn best_candidate(&self) -> &ModelCandidate {
        &self.candidates[self.best_index]
    }

    pub fn best_model_name(&self) -> &str {
        &self.candidates[self.best_index].name
    }

    /// The fitted winner, as trained on the train partition
    pub fn best_model(&self) -> &dyn FittedRegressor {
        self.best_model.as_ref()
    }

    pub fn forecast(&self) -> &ForecastSeries {
        &self.forecast
    }
}

/// Index of the lowest score; the earliest entry wins ties
pub fn select_best<'a, I>(scores: I) -> Option<usize>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    scores
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, (_, score))| match best {
            Some((_, best_score)) if score >= best_score => best,
            _ => Some((idx, score)),
        })
        .map(|(idx, _)| idx)
}

/// Trains every candidate on a chronological split and keeps the one with
/// the lowest test RMSE
#[derive(Debug)]
pub struct TabularForecastSelector {
    config: SelectorConfig,
    models: Vec<Box<dyn TabularRegressor>>,
}

impl TabularForecastSelector {
    /// Selector over linear regression, random forest and gradient boosting,
    /// evaluated in that order
    pub fn new(config: SelectorConfig) -> Result<Self> {
        config.validate()?;
        let models: Vec<Box<dyn TabularRegressor>> = vec![
            Box::new(LinearRegression::new()),
            Box::new(RandomForest::new(config.forest.clone())?),
            Box::new(GradientBoosting::new(config.boosting.clone())?),
        ];
        Self::with_models(config, models)
    }

    /// Selector over a caller-supplied, ordered list of models
    pub fn with_models(
        config: SelectorConfig,
        models: Vec<Box<dyn TabularRegressor>>,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one candidate model is required".to_string(),
            ));
        }
        Ok(Self { config, models })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    /// Split `holdout_months` before the last observation, then select
    pub fn run(&self, aggregate: &DailyAggregate) -> Result<SelectionReport> {
        let last = aggregate.last_date().ok_or_else(|| {
            ForecastError::InsufficientData("Daily aggregate is empty".to_string())
        })?;
        let cutoff = cutoff_months_before(last, self.config.holdout_months)?;
        self.run_with_cutoff(aggregate, cutoff)
    }

    /// Select using an explicit cutoff date
    pub fn run_with_cutoff(
        &self,
        aggregate: &DailyAggregate,
        cutoff: NaiveDate,
    ) -> Result<SelectionReport> {
        let split = chronological_split(aggregate, cutoff)?;

        let train_features = split.train.calendar_features();
        let train_target = split.train.sales();
        let test_features = split.test.calendar_features();
        let test_target = split.test.sales();

        let mut candidates = Vec::with_capacity(self.models.len());
        let mut fitted = Vec::with_capacity(self.models.len());

        for model in &self.models {
            let trained = model.fit(&train_features, &train_target)?;
            let predictions = trained.predict(&test_features);
            if predictions.len() != test_target.len() || predictions.iter().any(|p| !p.is_finite())
            {
                return Err(ForecastError::training(
                    model.name(),
                    "produced non-finite or missing test predictions",
                ));
            }

            let rmse = root_mean_squared_error(&test_target, &predictions)?;
            tracing::info!(model = model.name(), rmse, "scored candidate");

            candidates.push(ModelCandidate {
                name: model.name().to_string(),
                test_predictions: predictions,
                rmse,
            });
            fitted.push(trained);
        }

        let best_index = select_best(candidates.iter().map(|c| (c.name.as_str(), c.rmse)))
            .ok_or_else(|| {
                ForecastError::InvalidParameter("No candidate models were evaluated".to_string())
            })?;
        let best_model = fitted.swap_remove(best_index);
        tracing::info!(
            model = candidates[best_index].name.as_str(),
            rmse = candidates[best_index].rmse,
            "selected best tabular model"
        );

        let last = aggregate.last_date().ok_or_else(|| {
            ForecastError::InsufficientData("Daily aggregate is empty".to_string())
        })?;
        let dates = future_dates(last, self.config.horizon_days);
        let future_features: Vec<_> = dates.iter().map(|&d| calendar_features(d)).collect();
        let forecast = ForecastSeries::new(dates, best_model.predict(&future_features))?;

        Ok(SelectionReport {
            split,
            candidates,
            best_index,
            best_model,
            forecast,
        })
    }
}
