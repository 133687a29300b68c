//! Daily revenue aggregation and calendar regressors

use crate::data::{
    column_as_dates, column_as_f64, require_column, TransactionRecord, DATE_COLUMN,
    ITEM_COUNT_COLUMN, PRICE_COLUMN,
};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of calendar regressors fed to tabular models
pub const FEATURE_COUNT: usize = 4;

/// Total revenue on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub sales: f64,
}

/// Revenue per calendar day, sorted ascending with unique dates.
///
/// Days absent from the source stay absent; the series can be irregular.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    observations: Vec<DailyObservation>,
}

impl DailyAggregate {
    /// Aggregate `(date, sales)` pairs by summing sales per date
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (date, sales) in pairs {
            *totals.entry(date).or_insert(0.0) += sales;
        }

        Self {
            observations: totals
                .into_iter()
                .map(|(date, sales)| DailyObservation { date, sales })
                .collect(),
        }
    }

    pub fn from_records(records: &[TransactionRecord]) -> Self {
        Self::from_pairs(records.iter().map(|r| (r.date, r.sales())))
    }

    pub fn observations(&self) -> &[DailyObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn sales(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.sales).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Sales on a given date, if that date is present
    pub fn sales_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|idx| self.observations[idx].sales)
    }

    /// Calendar regressors for every observation, in order
    pub fn calendar_features(&self) -> Vec<CalendarFeatures> {
        self.observations
            .iter()
            .map(|o| calendar_features(o.date))
            .collect()
    }

    /// Keep observations matching `predicate`, preserving order
    pub(crate) fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&DailyObservation) -> bool,
    {
        Self {
            observations: self
                .observations
                .iter()
                .copied()
                .filter(|o| predicate(o))
                .collect(),
        }
    }
}

/// Calendar regressors derived from a date.
///
/// `day_of_week` counts from Monday = 0 to Sunday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarFeatures {
    pub day_of_week: u32,
    pub month: u32,
    pub quarter: u32,
    pub day_of_month: u32,
}

impl CalendarFeatures {
    /// Regressor row in the fixed order day_of_week, month, quarter, day_of_month
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.day_of_week as f64,
            self.month as f64,
            self.quarter as f64,
            self.day_of_month as f64,
        ]
    }
}

/// The single encoding used for train, test and future rows
pub fn calendar_features(date: NaiveDate) -> CalendarFeatures {
    let month = date.month();
    CalendarFeatures {
        day_of_week: date.weekday().num_days_from_monday(),
        month,
        quarter: (month - 1) / 3 + 1,
        day_of_month: date.day(),
    }
}

/// `horizon` consecutive days starting the day after `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|offset| last + Duration::days(offset))
        .collect()
}

/// Aggregate a merged transaction table into daily revenue.
///
/// Requires `date`, `price` and `item_count` columns; revenue per row is
/// `price * item_count`.
pub fn daily_aggregate(df: &DataFrame) -> Result<DailyAggregate> {
    let price = column_as_f64(require_column(df, PRICE_COLUMN)?)?;
    let item_count = column_as_f64(require_column(df, ITEM_COUNT_COLUMN)?)?;
    let dates = column_as_dates(require_column(df, DATE_COLUMN)?)?;

    if price
        .iter()
        .chain(item_count.iter())
        .any(|v| !(v.is_finite() && *v >= 0.0))
    {
        return Err(ForecastError::DataError(
            "price and item_count must be finite and non-negative".to_string(),
        ));
    }

    let aggregate = DailyAggregate::from_pairs(
        dates
            .into_iter()
            .zip(price.iter().zip(item_count.iter()))
            .map(|(date, (p, c))| (date, p * c)),
    );

    tracing::debug!(
        rows = df.height(),
        days = aggregate.len(),
        "derived daily aggregate"
    );
    Ok(aggregate)
}
