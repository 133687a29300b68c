//! # Sales Forecast Workspace
//!
//! Umbrella crate for the demand forecasting workspace. It re-exports the
//! member crates so demos and downstream users can depend on one package.
//!
//! ## Example
//!
//! ```
//! use sales_forecast_workspace::forecast_math::MinMaxScaler;
//!
//! let scaler = MinMaxScaler::fit(&[10.0, 20.0, 30.0]).unwrap();
//! assert_eq!(scaler.transform_value(20.0), 0.5);
//! ```

pub use forecast_math;
pub use sales_forecast;

pub use sales_forecast::{ForecastError, ForecastPipeline, PipelineConfig, Result};
