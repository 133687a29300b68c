//! Pipeline configuration
//!
//! Every section deserializes with defaults, so a JSON file only needs the
//! keys it overrides:
//!
//! ```json
//! { "sequence": { "eval_epochs": 5, "production_epochs": 3 } }
//! ```

use crate::error::{ForecastError, Result};
use crate::models::{BoostingConfig, ForestConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for the tabular forecast selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Months before the last observation where the test partition starts
    pub holdout_months: u32,
    /// Days forecast past the last observation
    pub horizon_days: usize,
    pub forest: ForestConfig,
    pub boosting: BoostingConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            holdout_months: 6,
            horizon_days: 365,
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

impl SelectorConfig {
    pub fn with_holdout_months(mut self, months: u32) -> Self {
        self.holdout_months = months;
        self
    }

    pub fn with_horizon_days(mut self, days: usize) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_boosting(mut self, boosting: BoostingConfig) -> Self {
        self.boosting = boosting;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon_days must be positive".to_string(),
            ));
        }
        if self.forest.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "forest.n_trees must be positive".to_string(),
            ));
        }
        if self.boosting.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "boosting.n_estimators must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the windowed LSTM forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Length of each input window
    pub window: usize,
    /// LSTM hidden width
    pub hidden_size: usize,
    /// Dropout probability on the final hidden state
    pub dropout: f64,
    /// Adam step size
    pub learning_rate: f64,
    /// Windows per gradient step
    pub batch_size: usize,
    /// Gradient norm clipping threshold
    pub gradient_clip: Option<f64>,
    /// Months before the last observation where the evaluation test segment starts
    pub eval_holdout_months: u32,
    /// Epochs for the evaluation pass
    pub eval_epochs: usize,
    /// Epochs for the full-data refit
    pub production_epochs: usize,
    /// Days forecast by the production pass
    pub horizon: usize,
    /// Random seed for weights, dropout and batch order
    pub seed: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            window: 30,
            hidden_size: 50,
            dropout: 0.2,
            learning_rate: 0.001,
            batch_size: 32,
            gradient_clip: Some(1.0),
            eval_holdout_months: 12,
            eval_epochs: 20,
            production_epochs: 10,
            horizon: 90,
            seed: 42,
        }
    }
}

impl SequenceConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_epochs(mut self, eval_epochs: usize, production_epochs: usize) -> Self {
        self.eval_epochs = eval_epochs;
        self.production_epochs = production_epochs;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(ForecastError::InvalidParameter(
                "window must be positive".to_string(),
            ));
        }
        if self.hidden_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "hidden_size must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::InvalidParameter(
                "dropout must be in [0, 1)".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(ForecastError::InvalidParameter(
                "learning_rate must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.gradient_clip.map_or(false, |c| c <= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "gradient_clip must be positive when set".to_string(),
            ));
        }
        if self.eval_epochs == 0 || self.production_epochs == 0 {
            return Err(ForecastError::InvalidParameter(
                "epoch budgets must be positive".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full pipeline settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub selector: SelectorConfig,
    pub sequence: SequenceConfig,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.selector.validate()?;
        self.sequence.validate()
    }
}
