//! Least-squares fitting for small dense regressor sets

use crate::{MathError, Result};

/// Coefficients of `y = intercept + sum(coefficients[j] * x[j])`
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LeastSquaresFit {
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Relative pivot size below which a column is treated as linearly dependent
const PIVOT_TOLERANCE: f64 = 1e-9;

/// Ordinary least squares with an intercept.
///
/// Solves the centred normal equations by Gauss-Jordan elimination with
/// partial pivoting. Columns that are constant or linearly dependent on
/// earlier columns receive a zero coefficient, so rank-deficient designs
/// (e.g. fewer rows than regressors) still yield a least-squares solution.
pub fn least_squares<R: AsRef<[f64]>>(rows: &[R], target: &[f64]) -> Result<LeastSquaresFit> {
    let n = rows.len();
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Least squares needs at least one observation".to_string(),
        ));
    }
    if target.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Rows ({}) and target ({}) differ in length",
            n,
            target.len()
        )));
    }

    let k = rows[0].as_ref().len();
    if rows.iter().any(|r| r.as_ref().len() != k) {
        return Err(MathError::InvalidInput(
            "All rows must have the same number of regressors".to_string(),
        ));
    }

    let y_mean = target.iter().sum::<f64>() / n as f64;
    let mut x_mean = vec![0.0; k];
    for row in rows {
        for (m, x) in x_mean.iter_mut().zip(row.as_ref()) {
            *m += x / n as f64;
        }
    }

    // Normal equations on centred data: A beta = b
    let mut a = vec![vec![0.0; k]; k];
    let mut b = vec![0.0; k];
    for (row, &y) in rows.iter().zip(target) {
        let centred: Vec<f64> = row
            .as_ref()
            .iter()
            .zip(&x_mean)
            .map(|(x, m)| x - m)
            .collect();
        let dy = y - y_mean;
        for i in 0..k {
            b[i] += centred[i] * dy;
            for j in 0..k {
                a[i][j] += centred[i] * centred[j];
            }
        }
    }

    let scale = (0..k).map(|i| a[i][i]).fold(0.0_f64, f64::max);
    let tolerance = scale.max(1.0) * PIVOT_TOLERANCE;

    let mut pivot_columns = Vec::with_capacity(k);
    let mut row = 0;
    for col in 0..k {
        if row == k {
            break;
        }
        let (best, magnitude) = (row..k)
            .map(|r| (r, a[r][col].abs()))
            .fold((row, 0.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        if magnitude < tolerance {
            continue;
        }

        a.swap(row, best);
        b.swap(row, best);

        let pivot = a[row][col];
        for value in a[row].iter_mut() {
            *value /= pivot;
        }
        b[row] /= pivot;

        for r in 0..k {
            if r == row {
                continue;
            }
            let factor = a[r][col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..k {
                a[r][c] -= factor * a[row][c];
            }
            b[r] -= factor * b[row];
        }

        pivot_columns.push(col);
        row += 1;
    }

    let mut coefficients = vec![0.0; k];
    for (r, &col) in pivot_columns.iter().enumerate() {
        coefficients[col] = b[r];
    }

    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&x_mean)
            .map(|(c, m)| c * m)
            .sum::<f64>();

    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares produced non-finite coefficients".to_string(),
        ));
    }

    Ok(LeastSquaresFit {
        intercept,
        coefficients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn recovers_exact_linear_relationship() {
        let rows: Vec<[f64; 2]> = (0..20)
            .map(|i| [i as f64, ((i * 7) % 5) as f64])
            .collect();
        let target: Vec<f64> = rows.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let fit = least_squares(&rows, &target).unwrap();
        assert_abs_diff_eq!(fit.intercept, 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[1], -0.5, epsilon = 1e-8);
    }

    #[test]
    fn constant_column_gets_zero_coefficient() {
        let rows: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 4.0]).collect();
        let target: Vec<f64> = rows.iter().map(|r| 1.0 + r[0]).collect();

        let fit = least_squares(&rows, &target).unwrap();
        assert_eq!(fit.coefficients[1], 0.0);
        assert_abs_diff_eq!(fit.predict(&[12.0, 4.0]), 13.0, epsilon = 1e-8);
    }

    #[test]
    fn underdetermined_system_still_fits_training_rows() {
        let rows = vec![[1.0, 2.0, 3.0, 4.0], [2.0, 1.0, 3.0, 5.0]];
        let target = [100.0, 150.0];

        let fit = least_squares(&rows, &target).unwrap();
        for (row, y) in rows.iter().zip(target) {
            assert_abs_diff_eq!(fit.predict(row), y, epsilon = 1e-6);
        }
    }

    #[test]
    fn single_row_predicts_its_target() {
        let fit = least_squares(&[[5.0, 6.0]], &[42.0]).unwrap();
        assert_eq!(fit.coefficients, vec![0.0, 0.0]);
        assert_eq!(fit.intercept, 42.0);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let result = least_squares(&[[1.0], [2.0]], &[1.0]);
        assert!(matches!(result, Err(MathError::InvalidInput(_))));
    }
}
