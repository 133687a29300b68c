//! Bagged regression trees

use super::tree::{RegressionTree, TreeConfig};
use crate::error::{ForecastError, Result};
use crate::features::{CalendarFeatures, FEATURE_COUNT};
use crate::models::{check_training_input, feature_rows, FittedRegressor, TabularRegressor};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random Forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Settings for every tree
    pub tree: TreeConfig,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeConfig::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Random Forest model
#[derive(Debug, Clone)]
pub struct RandomForest {
    name: String,
    config: ForestConfig,
}

/// Trained Random Forest
#[derive(Debug, Clone)]
pub struct TrainedRandomForest {
    name: String,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Result<Self> {
        if config.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "Random forest needs at least one tree".to_string(),
            ));
        }

        Ok(Self {
            name: "Random Forest".to_string(),
            config,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl RandomForest {
    /// Fit the forest, keeping the concrete trained type
    pub fn train(
        &self,
        features: &[CalendarFeatures],
        target: &[f64],
    ) -> Result<TrainedRandomForest> {
        check_training_input(&self.name, features, target)?;

        let rows = feature_rows(features);
        let n = rows.len();

        // Each tree owns a seed derived from its position, so the result does
        // not depend on how rayon schedules the work.
        let trees: Vec<RegressionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = if self.config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(&self.config.tree, &rows, target, &sample, &mut rng)
            })
            .collect();

        tracing::debug!(trees = trees.len(), samples = n, "fitted random forest");

        Ok(TrainedRandomForest {
            name: self.name.clone(),
            trees,
        })
    }
}

impl TabularRegressor for RandomForest {
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

impl TrainedRandomForest {
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }
}

impl FittedRegressor for TrainedRandomForest {
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
