//! Sliding windows for supervised training and autoregressive rollout

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use std::collections::VecDeque;

/// Supervised pairs cut from a series: row `t` holds `series[t..t+W]`, target `series[t+W]`
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedWindows {
    pub inputs: Array2<f64>,
    pub targets: Array1<f64>,
}

impl SupervisedWindows {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn window(&self) -> usize {
        self.inputs.ncols()
    }
}

/// Cut every full window of length `window` with the value that follows it
pub fn build_windows(series: &[f64], window: usize) -> Result<SupervisedWindows> {
    if window == 0 {
        return Err(ForecastError::InvalidParameter(
            "window must be positive".to_string(),
        ));
    }
    if series.len() < window + 1 {
        return Err(ForecastError::InsufficientData(format!(
            "Need at least {} observations for window {}, got {}",
            window + 1,
            window,
            series.len()
        )));
    }

    let n = series.len() - window;
    let inputs = Array2::from_shape_fn((n, window), |(t, k)| series[t + k]);
    let targets = Array1::from_iter(series[window..].iter().copied());

    Ok(SupervisedWindows { inputs, targets })
}

/// Fixed-length buffer of the most recent values
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    buffer: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(seed: &[f64]) -> Self {
        Self {
            buffer: seed.iter().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append `value` and drop the oldest entry
    pub fn push(&mut self, value: f64) {
        self.buffer.pop_front();
        self.buffer.push_back(value);
    }

    /// Values in time order
    pub fn values(&mut self) -> &[f64] {
        self.buffer.make_contiguous()
    }
}

/// Anything that maps the latest window of values to the next value
pub trait NextStepPredictor {
    /// Window length the predictor expects
    fn window(&self) -> usize;

    fn predict_next(&self, window: &[f64]) -> f64;
}

/// Feed each prediction back into the window until `horizon` values exist
pub fn rollout<P>(predictor: &P, seed: &[f64], horizon: usize) -> Result<Vec<f64>>
where
    P: NextStepPredictor + ?Sized,
{
    if seed.len() != predictor.window() {
        return Err(ForecastError::InvalidParameter(format!(
            "Rollout seed has {} values, predictor expects {}",
            seed.len(),
            predictor.window()
        )));
    }

    let mut buffer = RollingWindow::new(seed);
    let mut predictions = Vec::with_capacity(horizon);

    for step in 0..horizon {
        let next = predictor.predict_next(buffer.values());
        if !next.is_finite() {
            return Err(ForecastError::NumericInstability(format!(
                "Non-finite prediction at rollout step {}",
                step
            )));
        }
        predictions.push(next);
        buffer.push(next);
    }

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LastValue(usize);

    impl NextStepPredictor for LastValue {
        fn window(&self) -> usize {
            self.0
        }

        fn predict_next(&self, window: &[f64]) -> f64 {
            assert_eq!(window.len(), self.0);
            window[window.len() - 1] + 1.0
        }
    }

    #[test]
    fn windows_pair_with_following_value() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let windows = build_windows(&series, 3).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows.inputs.row(1).to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(windows.targets.to_vec(), vec![4.0, 5.0]);
    }

    #[test]
    fn rollout_keeps_buffer_length() {
        let predictions = rollout(&LastValue(3), &[0.0, 1.0, 2.0], 5).unwrap();
        assert_eq!(predictions, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn rolling_window_drops_oldest() {
        let mut window = RollingWindow::new(&[1.0, 2.0]);
        window.push(3.0);
        assert_eq!(window.len(), 2);
        assert_eq!(window.values(), &[2.0, 3.0]);
    }
}
