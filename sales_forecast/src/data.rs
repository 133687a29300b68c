//! Merged transaction data and the provider seam that supplies it

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Column holding the transaction date
pub const DATE_COLUMN: &str = "date";
/// Column holding the unit price
pub const PRICE_COLUMN: &str = "price";
/// Column holding the number of units sold
pub const ITEM_COUNT_COLUMN: &str = "item_count";

/// Days between 0001-01-01 (CE day 1) and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One sale of an item at a store, as produced by the upstream merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub item_id: String,
    pub store_id: String,
    pub item_count: u64,
    pub price: f64,
    pub store_name: String,
    pub item_name: String,
}

impl TransactionRecord {
    /// Revenue of this transaction
    pub fn sales(&self) -> f64 {
        self.price * self.item_count as f64
    }
}

/// Source of the merged transaction table.
///
/// Implementations are expected to hand over lowercase column names with
/// `item_id`/`store_id` join keys already resolved.
pub trait MergedDatasetProvider {
    fn get_merged_transactions(&self) -> Result<DataFrame>;
}

/// Provider over an already-built DataFrame
#[derive(Debug, Clone)]
pub struct DataFrameProvider {
    df: DataFrame,
}

impl DataFrameProvider {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }
}

impl MergedDatasetProvider for DataFrameProvider {
    fn get_merged_transactions(&self) -> Result<DataFrame> {
        Ok(self.df.clone())
    }
}

/// Provider over typed in-memory records
#[derive(Debug, Clone, Default)]
pub struct RecordsProvider {
    records: Vec<TransactionRecord>,
}

impl RecordsProvider {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }
}

impl MergedDatasetProvider for RecordsProvider {
    fn get_merged_transactions(&self) -> Result<DataFrame> {
        records_to_dataframe(&self.records)
    }
}

/// Provider reading a single, already-merged CSV file
#[derive(Debug, Clone)]
pub struct CsvDatasetProvider {
    path: PathBuf,
}

impl CsvDatasetProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MergedDatasetProvider for CsvDatasetProvider {
    fn get_merged_transactions(&self) -> Result<DataFrame> {
        let file = File::open(&self.path)?;
        let mut df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        let lowercase: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect();
        df.set_column_names(&lowercase)?;

        tracing::debug!(
            path = %self.path.display(),
            rows = df.height(),
            "loaded merged transactions"
        );
        Ok(df)
    }
}

/// Build the merged table layout from typed records
pub fn records_to_dataframe(records: &[TransactionRecord]) -> Result<DataFrame> {
    let days: Vec<i32> = records
        .iter()
        .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let date_series = Series::new(DATE_COLUMN, days).cast(&DataType::Date)?;

    let df = DataFrame::new(vec![
        date_series,
        Series::new(
            "item_id",
            records.iter().map(|r| r.item_id.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            "store_id",
            records.iter().map(|r| r.store_id.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            ITEM_COUNT_COLUMN,
            records.iter().map(|r| r.item_count).collect::<Vec<u64>>(),
        ),
        Series::new(
            PRICE_COLUMN,
            records.iter().map(|r| r.price).collect::<Vec<f64>>(),
        ),
        Series::new(
            "store_name",
            records.iter().map(|r| r.store_name.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            "item_name",
            records.iter().map(|r| r.item_name.clone()).collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

/// Fetch a column or report it as missing
pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| ForecastError::MissingColumn(name.to_string()))
}

/// Read a numeric column of any integer or float dtype as f64
pub(crate) fn column_as_f64(series: &Series) -> Result<Vec<f64>> {
    if !series.dtype().is_numeric() {
        return Err(ForecastError::DataError(format!(
            "Column '{}' has non-numeric type {}",
            series.name(),
            series.dtype()
        )));
    }

    let casted = series.cast(&DataType::Float64)?;
    casted
        .f64()?
        .into_iter()
        .map(|value| {
            value.ok_or_else(|| {
                ForecastError::DataError(format!("Column '{}' contains nulls", series.name()))
            })
        })
        .collect()
}

/// Read a Date, Datetime or `%Y-%m-%d` string column as calendar dates
pub(crate) fn column_as_dates(series: &Series) -> Result<Vec<NaiveDate>> {
    let null_error =
        || ForecastError::DataError(format!("Column '{}' contains nulls", series.name()));

    match series.dtype() {
        DataType::Utf8 => series
            .utf8()?
            .into_iter()
            .map(|value| {
                let text = value.ok_or_else(null_error)?;
                NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| {
                    ForecastError::DataError(format!("Invalid date '{}': {}", text, e))
                })
            })
            .collect(),
        DataType::Date | DataType::Datetime(_, _) => {
            let as_date = series.cast(&DataType::Date)?;
            let days = as_date.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|value| {
                    let day = value.ok_or_else(null_error)?;
                    NaiveDate::from_num_days_from_ce_opt(day + UNIX_EPOCH_DAYS_FROM_CE).ok_or_else(
                        || ForecastError::DataError(format!("Date out of range: {} days", day)),
                    )
                })
                .collect()
        }
        other => Err(ForecastError::DataError(format!(
            "Column '{}' has type {} and cannot be read as dates",
            series.name(),
            other
        ))),
    }
}
