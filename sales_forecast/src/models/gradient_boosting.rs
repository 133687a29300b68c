//! Gradient boosted regression trees with squared loss

use super::tree::{RegressionTree, TreeConfig};
use crate::error::{ForecastError, Result};
use crate::features::{CalendarFeatures, FEATURE_COUNT};
use crate::models::{check_training_input, feature_rows, FittedRegressor, TabularRegressor};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Gradient boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    /// Depth of each weak learner
    pub max_depth: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// Gradient boosting model
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    name: String,
    config: BoostingConfig,
}

/// Trained gradient boosting model
#[derive(Debug, Clone)]
pub struct TrainedGradientBoosting {
    name: String,
    base_prediction: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    /// Training MSE after each round
    training_loss: Vec<f64>,
}

impl GradientBoosting {
    pub fn new(config: BoostingConfig) -> Result<Self> {
        if config.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "Gradient boosting needs at least one estimator".to_string(),
            ));
        }
        if config.learning_rate <= 0.0 || config.learning_rate > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Learning rate must be in (0, 1]".to_string(),
            ));
        }
        if config.max_depth == 0 {
            return Err(ForecastError::InvalidParameter(
                "Tree depth must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: "Gradient Boosting".to_string(),
            config,
        })
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }
}

impl TrainedGradientBoosting {
    pub fn training_loss(&self) -> &[f64] {
        &self.training_loss
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        self.base_prediction
            + self.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }
}

impl GradientBoosting {
    /// Fit the ensemble, keeping the concrete trained type
    pub fn train(
        &self,
        features: &[CalendarFeatures],
        target: &[f64],
    ) -> Result<TrainedGradientBoosting> {
        check_training_input(&self.name, features, target)?;

        let rows = feature_rows(features);
        let n = rows.len();
        let all: Vec<usize> = (0..n).collect();
        let tree_config = TreeConfig {
            max_depth: Some(self.config.max_depth),
            min_samples_split: 2,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: None,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let base_prediction = target.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_prediction; n];
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut training_loss = Vec::with_capacity(self.config.n_estimators);

        for round in 0..self.config.n_estimators {
            // Negative gradient of squared loss
            let residuals: Vec<f64> = target
                .iter()
                .zip(predictions.iter())
                .map(|(y, p)| y - p)
                .collect();

            let tree = RegressionTree::fit(&tree_config, &rows, &residuals, &all, &mut rng);
            for (pred, row) in predictions.iter_mut().zip(rows.iter()) {
                *pred += self.config.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);

            let loss = target
                .iter()
                .zip(predictions.iter())
                .map(|(y, p)| (y - p).powi(2))
                .sum::<f64>()
                / n as f64;
            if !loss.is_finite() {
                return Err(ForecastError::training(
                    &self.name,
                    format!("loss diverged at round {}", round),
                ));
            }
            training_loss.push(loss);
        }

        tracing::debug!(
            rounds = trees.len(),
            final_loss = training_loss.last().copied().unwrap_or_default(),
            "fitted gradient boosting"
        );

        Ok(TrainedGradientBoosting {
            name: self.name.clone(),
            base_prediction,
            learning_rate: self.config.learning_rate,
            trees,
            training_loss,
        })
    }
}

impl TabularRegressor for GradientBoosting {
    fn fit(
        &self,
        features: &[CalendarFeatures],
        target: &[f64],
    ) -> Result<Box<dyn FittedRegressor>> {
        Ok(Box::new(self.train(features, target)?))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedRegressor for TrainedGradientBoosting {
    fn predict(&self, features: &[CalendarFeatures]) -> Vec<f64> {
        features
            .iter()
            .map(|f| self.predict_row(&f.as_array()))
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
