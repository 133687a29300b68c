use chrono::{Datelike, Duration, NaiveDate};
use pretty_assertions::assert_eq;
use sales_forecast::config::SelectorConfig;
use sales_forecast::features::{CalendarFeatures, DailyAggregate};
use sales_forecast::models::{FittedRegressor, ForestConfig, LinearRegression, TabularRegressor};
use sales_forecast::selector::{select_best, TabularForecastSelector};
use sales_forecast::{ForecastError, Result};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Weekly pattern with a mild upward trend
fn weekly_aggregate(start: &str, days: i64) -> DailyAggregate {
    let start = date(start);
    DailyAggregate::from_pairs((0..days).map(|i| {
        let d = start + Duration::days(i);
        let weekend = if d.weekday().number_from_monday() >= 6 { 80.0 } else { 0.0 };
        (d, 200.0 + weekend + 0.05 * i as f64)
    }))
}

fn quick_config() -> SelectorConfig {
    SelectorConfig::default().with_forest(ForestConfig {
        n_trees: 10,
        ..ForestConfig::default()
    })
}

#[derive(Debug)]
struct Constant {
    name: &'static str,
    value: f64,
}

#[derive(Debug)]
struct FittedConstant {
    name: &'static str,
    value: f64,
}

impl TabularRegressor for Constant {
    fn fit(&self, _: &[CalendarFeatures], _: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        Ok(Box::new(FittedConstant {
            name: self.name,
            value: self.value,
        }))
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl FittedRegressor for FittedConstant {
    fn predict(&self, features: &[CalendarFeatures]) -> Vec<f64> {
        vec![self.value; features.len()]
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[derive(Debug)]
struct Unfittable;

impl TabularRegressor for Unfittable {
    fn fit(&self, _: &[CalendarFeatures], _: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        Err(ForecastError::ModelTrainingFailure {
            model: "unfittable".to_string(),
            reason: "solver did not converge".to_string(),
        })
    }

    fn name(&self) -> &str {
        "unfittable"
    }
}

#[test]
fn test_selector_surfaces_failing_candidate() {
    let aggregate = weekly_aggregate("2023-01-01", 400);
    let models: Vec<Box<dyn TabularRegressor>> =
        vec![Box::new(LinearRegression::new()), Box::new(Unfittable)];
    let selector = TabularForecastSelector::with_models(SelectorConfig::default(), models).unwrap();

    match selector.run(&aggregate) {
        Err(ForecastError::ModelTrainingFailure { model, .. }) => {
            assert_eq!(model, "unfittable")
        }
        other => panic!(
            "expected ModelTrainingFailure, got {:?}",
            other.map(|r| r.best_model_name().to_string())
        ),
    }
}

#[test]
fn test_selector_rejects_non_finite_predictions() {
    let aggregate = weekly_aggregate("2023-01-01", 400);
    let models: Vec<Box<dyn TabularRegressor>> = vec![
        Box::new(LinearRegression::new()),
        Box::new(Constant {
            name: "diverged",
            value: f64::NAN,
        }),
    ];
    let selector = TabularForecastSelector::with_models(SelectorConfig::default(), models).unwrap();

    match selector.run(&aggregate) {
        Err(ForecastError::ModelTrainingFailure { model, .. }) => {
            assert_eq!(model, "diverged")
        }
        other => panic!(
            "expected ModelTrainingFailure, got {:?}",
            other.map(|r| r.best_model_name().to_string())
        ),
    }
}

#[test]
fn test_selector_scores_single_test_point() {
    let aggregate = DailyAggregate::from_pairs(vec![
        (date("2023-01-01"), 100.0),
        (date("2023-01-02"), 150.0),
        (date("2023-01-03"), 120.0),
    ]);
    let selector = TabularForecastSelector::new(quick_config()).unwrap();

    let report = selector
        .run_with_cutoff(&aggregate, date("2023-01-02"))
        .unwrap();

    assert_eq!(report.split().train.sales(), vec![100.0, 150.0]);
    assert_eq!(report.split().test.sales(), vec![120.0]);
    assert_eq!(report.candidates().len(), 3);
    for candidate in report.candidates() {
        assert_eq!(candidate.test_predictions.len(), 1);
        let expected = (candidate.test_predictions[0] - 120.0).abs();
        assert!((candidate.rmse - expected).abs() < 1e-9);
    }

    let forecast = report.forecast();
    assert_eq!(forecast.len(), 365);
    assert_eq!(forecast.first().unwrap().date, date("2023-01-04"));
}

#[test]
fn test_selector_picks_lowest_rmse() {
    let aggregate = weekly_aggregate("2023-01-01", 730);
    let selector = TabularForecastSelector::new(quick_config()).unwrap();

    let report = selector.run(&aggregate).unwrap();

    assert_eq!(
        selector.model_names(),
        vec!["Linear Regression", "Random Forest", "Gradient Boosting"]
    );
    let rmse = report.rmse_by_model();
    assert_eq!(rmse.len(), 3);
    assert!(rmse.values().all(|r| *r >= 0.0 && r.is_finite()));

    let best = report.best_candidate().rmse;
    assert!(rmse.values().all(|r| best <= *r));
    assert_eq!(report.best_model().name(), report.best_model_name());

    // Last observation is 2024-12-30, so the cutoff lands on 2024-06-30
    assert_eq!(report.split().cutoff, date("2024-06-30"));
    let forecast = report.forecast();
    assert_eq!(forecast.len(), 365);
    assert_eq!(forecast.first().unwrap().date, date("2024-12-31"));
    assert_eq!(forecast.last().unwrap().date, date("2025-12-30"));
}

#[test]
fn test_selector_tie_keeps_first_model() {
    let aggregate = weekly_aggregate("2023-01-01", 400);
    let models: Vec<Box<dyn TabularRegressor>> = vec![
        Box::new(Constant {
            name: "first",
            value: 0.0,
        }),
        Box::new(Constant {
            name: "second",
            value: 0.0,
        }),
    ];
    let selector = TabularForecastSelector::with_models(SelectorConfig::default(), models).unwrap();

    let report = selector.run(&aggregate).unwrap();

    assert_eq!(report.best_model_name(), "first");
    assert!(report.forecast().values().iter().all(|v| *v == 0.0));
}

#[test]
fn test_select_best_fold() {
    assert_eq!(select_best(vec![("a", 3.0), ("b", 1.0), ("c", 1.0)]), Some(1));
    assert_eq!(select_best(vec![("a", 2.0), ("b", 2.0)]), Some(0));
    assert_eq!(select_best(Vec::<(&str, f64)>::new()), None);
}

#[test]
fn test_selector_requires_candidates() {
    assert!(matches!(
        TabularForecastSelector::with_models(SelectorConfig::default(), Vec::new()),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_selector_requires_both_partitions() {
    let aggregate = weekly_aggregate("2024-01-01", 30);
    let selector = TabularForecastSelector::new(quick_config()).unwrap();

    assert!(matches!(
        selector.run(&aggregate),
        Err(ForecastError::InsufficientData(_))
    ));
}
