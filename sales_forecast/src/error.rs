//! Error types for the sales_forecast crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A required column is absent from the merged table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A partition or window is too small to train or evaluate
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Scaling range is degenerate or a metric is undefined
    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    /// An estimator failed to fit or produced unusable output
    #[error("Model training failure in {model}: {reason}")]
    ModelTrainingFailure { model: String, reason: String },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error while reading configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while writing CSV output
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    pub(crate) fn training(model: impl Into<String>, reason: impl Into<String>) -> Self {
        ForecastError::ModelTrainingFailure {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::DegenerateRange { .. } => ForecastError::NumericInstability(err.to_string()),
            MathError::InsufficientData(msg) => ForecastError::InsufficientData(msg),
            MathError::InvalidInput(msg) => ForecastError::DataError(msg),
            MathError::CalculationError(msg) => ForecastError::NumericInstability(msg),
        }
    }
}
