use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use sales_forecast::config::SequenceConfig;
use sales_forecast::features::DailyAggregate;
use sales_forecast::sequence::{build_windows, rollout, NextStepPredictor, SequenceForecaster};
use sales_forecast::ForecastError;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn seasonal_aggregate(start: &str, days: i64) -> DailyAggregate {
    let start = date(start);
    DailyAggregate::from_pairs((0..days).map(|i| {
        let wave = (i as f64 * 2.0 * std::f64::consts::PI / 7.0).sin();
        (start + Duration::days(i), 500.0 + 60.0 * wave + 0.1 * i as f64)
    }))
}

/// Small network and short budgets so the full passes run quickly
fn small_config() -> SequenceConfig {
    SequenceConfig::default()
        .with_window(7)
        .with_hidden_size(8)
        .with_epochs(3, 2)
        .with_learning_rate(0.01)
}

struct MeanOfWindow {
    window: usize,
}

impl NextStepPredictor for MeanOfWindow {
    fn window(&self) -> usize {
        self.window
    }

    fn predict_next(&self, window: &[f64]) -> f64 {
        assert_eq!(window.len(), self.window);
        window.iter().sum::<f64>() / window.len() as f64
    }
}

#[test]
fn test_pass_rejects_series_shorter_than_window() {
    let forecaster = SequenceForecaster::new(SequenceConfig::default()).unwrap();
    let series: Vec<f64> = (0..29).map(|i| 100.0 + i as f64).collect();

    assert!(matches!(
        forecaster.train_and_roll(&series, 10, 1),
        Err(ForecastError::InsufficientData(_))
    ));
}

#[test]
fn test_pass_rejects_constant_series() {
    let forecaster = SequenceForecaster::new(SequenceConfig::default()).unwrap();
    let series = vec![50.0; 100];

    assert!(matches!(
        forecaster.train_and_roll(&series, 10, 1),
        Err(ForecastError::NumericInstability(_))
    ));
}

#[test]
fn test_build_windows_needs_one_extra_value() {
    let series: Vec<f64> = (0..30).map(f64::from).collect();
    assert!(matches!(
        build_windows(&series, 30),
        Err(ForecastError::InsufficientData(_))
    ));

    let windows = build_windows(&series, 29).unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows.targets[0], 29.0);
}

#[test]
fn test_rollout_emits_exactly_horizon_values() {
    let predictor = MeanOfWindow { window: 4 };
    let predictions = rollout(&predictor, &[4.0, 4.0, 8.0, 8.0], 3).unwrap();

    assert_eq!(predictions.len(), 3);
    assert_eq!(predictions[0], 6.0);
    assert_eq!(predictions[1], 6.5);
    assert_eq!(predictions[2], 7.125);

    assert!(matches!(
        rollout(&predictor, &[1.0, 2.0], 3),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_pass_outcome_is_in_original_units() {
    let forecaster = SequenceForecaster::new(small_config()).unwrap();
    let series = seasonal_aggregate("2024-01-01", 120).sales();

    let outcome = forecaster.train_and_roll(&series, 15, 2).unwrap();

    assert_eq!(outcome.predictions.len(), 15);
    assert_eq!(outcome.loss_history.len(), 2);
    assert_eq!(outcome.scaler.min(), series.iter().cloned().fold(f64::INFINITY, f64::min));
    assert!(outcome.predictions.iter().all(|p| p.is_finite()));
}

#[test]
fn test_evaluation_pass_covers_holdout() {
    let aggregate = seasonal_aggregate("2023-01-01", 500);
    let forecaster = SequenceForecaster::new(small_config()).unwrap();

    let report = forecaster.evaluate(&aggregate).unwrap();

    // Last date 2024-05-14, twelve months back is 2023-05-14
    assert_eq!(report.cutoff, date("2023-05-14"));
    assert_eq!(report.actual.len(), report.predictions.len());
    assert_eq!(report.predictions.first().unwrap().date, date("2023-05-15"));
    assert_eq!(report.predictions.last().unwrap().date, date("2024-05-14"));
    assert!(report.mape.is_finite() && report.mape >= 0.0);
    assert_eq!(report.loss_history.len(), 3);
}

#[test]
fn test_production_pass_forecasts_ninety_days() {
    let aggregate = seasonal_aggregate("2024-01-01", 200);
    let forecaster = SequenceForecaster::new(small_config()).unwrap();

    let production = forecaster.forecast(&aggregate).unwrap();

    let dates = production.forecast.dates();
    assert_eq!(dates.len(), 90);
    assert_eq!(dates[0], aggregate.last_date().unwrap() + Duration::days(1));
    assert!(dates
        .windows(2)
        .all(|pair| (pair[1] - pair[0]).num_days() == 1));
    assert_eq!(production.loss_history.len(), 2);
}

#[test]
fn test_sequence_config_is_validated() {
    assert!(matches!(
        SequenceForecaster::new(SequenceConfig::default().with_window(0)),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        SequenceForecaster::new(SequenceConfig::default().with_epochs(0, 1)),
        Err(ForecastError::InvalidParameter(_))
    ));
}
