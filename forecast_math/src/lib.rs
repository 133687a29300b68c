//! # Forecast Math
//!
//! Numeric building blocks shared by the demand forecasting pipeline.
//! This crate provides point-forecast error metrics, a min-max scaler with
//! inverse transform, and a small least-squares solver used by the linear
//! regressor.

use thiserror::Error;

pub mod linalg;
pub mod metrics;
pub mod scaling;

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every value in a fitting range was identical
    #[error("Degenerate range: all values equal {value}")]
    DegenerateRange { value: f64 },

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use linalg::least_squares;
pub use metrics::{
    mape_with_excluded, mean_absolute_error, mean_absolute_percentage_error, mean_squared_error,
    root_mean_squared_error,
};
pub use scaling::MinMaxScaler;
