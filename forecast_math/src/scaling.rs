//! Min-max scaling into the unit interval
//!
//! x_scaled = (x - min) / (max - min)

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// A fitted min-max transform.
///
/// Bounds come only from the series passed to [`MinMaxScaler::fit`]; values
/// outside that range map outside `[0, 1]` rather than being clipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler on a series.
    ///
    /// Fails with [`MathError::DegenerateRange`] when every value is equal,
    /// since the transform divides by `max - min`.
    pub fn fit(series: &[f64]) -> Result<Self> {
        if series.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty series".to_string(),
            ));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let min = series.iter().copied().fold(f64::INFINITY, f64::min);
        let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max - min == 0.0 {
            return Err(MathError::DegenerateRange { value: min });
        }

        Ok(Self { min, max })
    }

    /// Fit on `series` and return the scaler with the transformed values
    pub fn fit_transform(series: &[f64]) -> Result<(Self, Vec<f64>)> {
        let scaler = Self::fit(series)?;
        let scaled = scaler.transform(series);
        Ok((scaler, scaled))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn transform_value(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    pub fn inverse_transform_value(&self, value: f64) -> f64 {
        value * self.range() + self.min
    }

    /// Scale values with the fitted bounds
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform_value(v)).collect()
    }

    /// Map scaled values back to original units
    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .map(|&v| self.inverse_transform_value(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fit_transform_maps_bounds_to_unit_interval() {
        let (scaler, scaled) = MinMaxScaler::fit_transform(&[10.0, 20.0, 15.0]).unwrap();
        assert_eq!(scaler.min(), 10.0);
        assert_eq!(scaler.max(), 20.0);
        assert_eq!(scaled, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn round_trip_recovers_values_in_range() {
        let series = [123.4, 987.6, 456.7, 300.0, 555.5];
        let scaler = MinMaxScaler::fit(&series).unwrap();
        let restored = scaler.inverse_transform(&scaler.transform(&series));
        for (original, back) in series.iter().zip(restored.iter()) {
            assert_relative_eq!(original, back, max_relative = 1e-12);
        }
    }

    #[test]
    fn constant_series_is_degenerate() {
        let result = MinMaxScaler::fit(&[50.0; 40]);
        assert_eq!(result, Err(MathError::DegenerateRange { value: 50.0 }));
    }

    #[test]
    fn empty_and_non_finite_series_are_rejected() {
        assert!(matches!(
            MinMaxScaler::fit(&[]),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(
            MinMaxScaler::fit(&[1.0, f64::NAN]),
            Err(MathError::InvalidInput(_))
        ));
    }
}
