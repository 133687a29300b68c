use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use sales_forecast::config::{PipelineConfig, SelectorConfig, SequenceConfig};
use sales_forecast::data::{RecordsProvider, TransactionRecord};
use sales_forecast::forecast::{ForecastPoint, ForecastSeries};
use sales_forecast::models::ForestConfig;
use sales_forecast::{ForecastError, ForecastPipeline};
use tempfile::tempdir;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn two_store_records(start: &str, days: i64) -> Vec<TransactionRecord> {
    let start = date(start);
    let mut records = Vec::new();
    for i in 0..days {
        for (store, count) in [("s-1", 10 + (i % 7) as u64), ("s-2", 5 + (i % 3) as u64)] {
            records.push(TransactionRecord {
                date: start + Duration::days(i),
                item_id: "i-1".to_string(),
                store_id: store.to_string(),
                item_count: count,
                price: 2.5,
                store_name: store.to_uppercase(),
                item_name: "Tea".to_string(),
            });
        }
    }
    records
}

fn quick_config() -> PipelineConfig {
    PipelineConfig {
        selector: SelectorConfig::default().with_forest(ForestConfig {
            n_trees: 5,
            ..ForestConfig::default()
        }),
        sequence: SequenceConfig::default()
            .with_window(7)
            .with_hidden_size(6)
            .with_epochs(2, 1),
    }
}

#[test]
fn test_pipeline_runs_both_forecasters() {
    let provider = RecordsProvider::new(two_store_records("2023-01-01", 420));
    let pipeline = ForecastPipeline::new(quick_config()).unwrap();

    let report = pipeline.run(&provider).unwrap();

    assert_eq!(report.aggregate.len(), 420);
    assert_eq!(report.tabular.candidates().len(), 3);
    assert_eq!(report.tabular.forecast().len(), 365);
    assert_eq!(report.sequence.production.forecast.len(), 90);

    let last = report.aggregate.last_date().unwrap();
    assert_eq!(report.tabular.forecast().first().unwrap().date, last + Duration::days(1));
    assert_eq!(
        report.sequence.production.forecast.first().unwrap().date,
        last + Duration::days(1)
    );
}

#[test]
fn test_pipeline_aborts_without_partial_report() {
    // Enough history for the tabular split, too little for the twelve month holdout
    let provider = RecordsProvider::new(two_store_records("2024-01-01", 200));
    let pipeline = ForecastPipeline::new(quick_config()).unwrap();

    assert!(matches!(
        pipeline.run(&provider),
        Err(ForecastError::InsufficientData(_))
    ));
}

#[test]
fn test_forecast_series_export() {
    let series = ForecastSeries::new(
        vec![date("2025-01-01"), date("2025-01-02")],
        vec![10.5, 11.0],
    )
    .unwrap();

    let json = series.to_json().unwrap();
    let parsed: Vec<ForecastPoint> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, series.points().to_vec());

    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast.csv");
    series.write_csv(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "date,value\n2025-01-01,10.5\n2025-01-02,11.0\n");
}

#[test]
fn test_forecast_series_length_mismatch() {
    assert!(matches!(
        ForecastSeries::new(vec![date("2025-01-01")], vec![]),
        Err(ForecastError::DataError(_))
    ));
}
