//! Ordinary least squares over calendar features

use crate::error::{ForecastError, Result};
use crate::features::CalendarFeatures;
use crate::models::{check_training_input, feature_rows, FittedRegressor, TabularRegressor};
use forecast_math::linalg::{least_squares, LeastSquaresFit};

/// Linear regression with an intercept
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// Name of the model
    name: String,
}

/// Trained linear regression
#[derive(Debug, Clone)]
pub struct TrainedLinearRegression {
    name: String,
    fit: LeastSquaresFit,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            name: "Linear Regression".to_string(),
        }
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainedLinearRegression {
    pub fn intercept(&self) -> f64 {
        self.fit.intercept
    }

    /// Coefficients in day_of_week, month, quarter, day_of_month order
    pub fn coefficients(&self) -> &[f64] {
        &self.fit.coefficients
    }
}

impl LinearRegression {
    /// Fit the coefficients, keeping the concrete trained type
    pub fn train(
        &self,
        features: &[CalendarFeatures],
        target: &[f64],
    ) -> Result<TrainedLinearRegression> {
        check_training_input(&self.name, features, target)?;

        let fit = least_squares(&feature_rows(features), target)
            .map_err(|e| ForecastError::training(&self.name, e.to_string()))?;

        Ok(TrainedLinearRegression {
            name: self.name.clone(),
            fit,
        })
    }
}

impl TabularRegressor for LinearRegression {
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

impl FittedRegressor for TrainedLinearRegression {
    fn predict(&self, features: &[CalendarFeatures]) -> Vec<f64> {
        features
            .iter()
            .map(|f| self.fit.predict(&f.as_array()))
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
