//! # Sales Forecast
//!
//! Daily sales demand forecasting over a merged transaction table.
//!
//! ## Features
//!
//! - Daily revenue aggregation with calendar features
//! - Chronological train/test splitting by calendar months
//! - Tabular model selection (Linear Regression, Random Forest, Gradient Boosting) by test RMSE
//! - Windowed LSTM forecasting with an evaluation pass and a production pass
//! - JSON configuration and CSV/JSON forecast export
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::config::PipelineConfig;
//! use sales_forecast::data::CsvDatasetProvider;
//! use sales_forecast::pipeline::ForecastPipeline;
//!
//! # fn main() -> sales_forecast::Result<()> {
//! let provider = CsvDatasetProvider::new("merged_sales.csv");
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let report = pipeline.run(&provider)?;
//!
//! println!("best tabular model: {}", report.tabular.best_model_name());
//! println!("sequence MAPE: {:.2}%", report.sequence.evaluation.mape);
//! report.tabular.forecast().write_csv("tabular_forecast.csv")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod models;
pub mod pipeline;
pub mod selector;
pub mod sequence;
pub mod split;

// Re-export commonly used types
pub use crate::config::{PipelineConfig, SelectorConfig, SequenceConfig};
pub use crate::data::{MergedDatasetProvider, TransactionRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{calendar_features, daily_aggregate, CalendarFeatures, DailyAggregate};
pub use crate::forecast::{ForecastPoint, ForecastSeries};
pub use crate::models::{FittedRegressor, TabularRegressor};
pub use crate::pipeline::{ForecastPipeline, PipelineReport};
pub use crate::selector::{SelectionReport, TabularForecastSelector};
pub use crate::sequence::{SequenceForecaster, SequenceReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
