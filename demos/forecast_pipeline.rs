// Runs the full forecasting pipeline on a synthetic two-year sales history
use chrono::{Datelike, Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sales_forecast_workspace::sales_forecast::data::RecordsProvider;
use sales_forecast_workspace::sales_forecast::{
    ForecastPipeline, PipelineConfig, SequenceConfig, TransactionRecord,
};
use tracing::Level;

fn synthetic_records(start: NaiveDate, days: i64) -> Vec<TransactionRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let stores = ["north", "south"];
    let items = [("i-1", "coffee", 3.5), ("i-2", "bagel", 2.0)];

    let mut records = Vec::new();
    for offset in 0..days {
        let date = start + Duration::days(offset);
        let weekend = date.weekday().number_from_monday() >= 6;
        let season = 1.0 + 0.3 * (2.0 * std::f64::consts::PI * date.ordinal() as f64 / 365.0).sin();

        for store in stores {
            for (item_id, item_name, price) in items {
                let base = if weekend { 40.0 } else { 25.0 };
                let count = (base * season + rng.gen_range(-5.0..5.0)).max(0.0) as u64;
                records.push(TransactionRecord {
                    date,
                    item_id: item_id.to_string(),
                    store_id: store.to_string(),
                    item_count: count,
                    price,
                    store_name: store.to_string(),
                    item_name: item_name.to_string(),
                });
            }
        }
    }
    records
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let start = NaiveDate::from_ymd_opt(2022, 1, 1).ok_or("invalid start date")?;
    let provider = RecordsProvider::new(synthetic_records(start, 730));

    // Short epoch budgets keep the demo quick
    let mut config = PipelineConfig::default();
    config.sequence = SequenceConfig::default().with_epochs(4, 2);

    let pipeline = ForecastPipeline::new(config)?;
    let report = pipeline.run(&provider)?;

    println!("Tabular candidates:");
    for (name, rmse) in report.tabular.rmse_by_model() {
        println!("  {:<20} RMSE {:>10.2}", name, rmse);
    }
    println!("Best tabular model: {}", report.tabular.best_model_name());

    let tabular = report.tabular.forecast();
    if let (Some(first), Some(last)) = (tabular.first(), tabular.last()) {
        println!(
            "Tabular forecast: {} days, {} = {:.2} .. {} = {:.2}",
            tabular.len(),
            first.date,
            first.value,
            last.date,
            last.value
        );
    }

    println!(
        "Sequence evaluation: MAPE {:.2}% over {} held-out days",
        report.sequence.evaluation.mape,
        report.sequence.evaluation.actual.len()
    );
    let sequence = &report.sequence.production.forecast;
    println!("Sequence forecast: {} days", sequence.len());
    for point in sequence.points().iter().take(7) {
        println!("  {}  {:>10.2}", point.date, point.value);
    }

    Ok(())
}
