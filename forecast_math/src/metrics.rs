//! Point-forecast accuracy metrics
//!
//! All metrics take `actual` first and `predicted` second and average over
//! the supplied slices only (population mean).

use crate::{MathError, Result};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot score an empty set of observations".to_string(),
        ));
    }
    if actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Mean squared error
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Root mean squared error: `sqrt(mean((actual - predicted)^2))`
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(actual, predicted)?.sqrt())
}

/// Mean absolute percentage error, in percent.
///
/// Observations whose actual value is exactly zero are excluded from both
/// the sum and the count. Fails if no observation remains.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mape_with_excluded(actual, predicted).map(|(mape, _)| mape)
}

/// MAPE together with the number of zero actuals left out of it
pub fn mape_with_excluded(actual: &[f64], predicted: &[f64]) -> Result<(f64, usize)> {
    check_lengths(actual, predicted)?;

    let (sum, count) = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (a, p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });

    if count == 0 {
        return Err(MathError::CalculationError(
            "MAPE is undefined when every actual value is zero".to_string(),
        ));
    }

    Ok((sum / count as f64 * 100.0, actual.len() - count))
}
