//! Tabular regressors over calendar features
//!
//! Every regressor takes the same four-column [`CalendarFeatures`] input and
//! a scalar `sales` target. Fitting an estimator produces a separate fitted
//! model, so one configured estimator can be trained on several datasets.

use crate::error::Result;
use crate::features::{CalendarFeatures, FEATURE_COUNT};
use std::fmt::Debug;

/// A trained regressor
pub trait FittedRegressor: Debug + Send + Sync {
    /// Predict one value per feature row
    fn predict(&self, features: &[CalendarFeatures]) -> Vec<f64>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// A regressor that can be fitted on calendar features
pub trait TabularRegressor: Debug + Send + Sync {
    /// Train on `features` with `target` as the response
    fn fit(&self, features: &[CalendarFeatures], target: &[f64])
        -> Result<Box<dyn FittedRegressor>>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Feature rows as plain arrays in the canonical column order
pub(crate) fn feature_rows(features: &[CalendarFeatures]) -> Vec<[f64; FEATURE_COUNT]> {
    features.iter().map(CalendarFeatures::as_array).collect()
}

/// Shared input validation for all regressors
pub(crate) fn check_training_input(
    model: &str,
    features: &[CalendarFeatures],
    target: &[f64],
) -> Result<()> {
    if features.is_empty() {
        return Err(crate::error::ForecastError::training(
            model,
            "training set is empty",
        ));
    }
    if features.len() != target.len() {
        return Err(crate::error::ForecastError::training(
            model,
            format!(
                "features ({}) and target ({}) differ in length",
                features.len(),
                target.len()
            ),
        ));
    }
    if target.iter().any(|y| !y.is_finite()) {
        return Err(crate::error::ForecastError::training(
            model,
            "target contains non-finite values",
        ));
    }
    Ok(())
}

pub mod gradient_boosting;
pub mod linear;
pub mod random_forest;
pub mod tree;

pub use gradient_boosting::{BoostingConfig, GradientBoosting};
pub use linear::LinearRegression;
pub use random_forest::{ForestConfig, RandomForest};
pub use tree::{RegressionTree, TreeConfig};
