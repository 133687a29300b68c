//! Chronological train/test partitioning

use crate::error::{ForecastError, Result};
use crate::features::DailyAggregate;
use chrono::{Months, NaiveDate};

/// A non-shuffled split: every train date is on or before `cutoff`, every
/// test date is strictly after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChronologicalSplit {
    pub cutoff: NaiveDate,
    pub train: DailyAggregate,
    pub test: DailyAggregate,
}

/// `date` moved back by whole calendar months, clamped to the month end
pub fn cutoff_months_before(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "Cannot move {} back by {} months",
                date, months
            ))
        })
}

/// Split at the cutoff derived from the last observation
pub fn split_months_before_end(
    aggregate: &DailyAggregate,
    months: u32,
) -> Result<ChronologicalSplit> {
    let last = aggregate.last_date().ok_or_else(|| {
        ForecastError::InsufficientData("Daily aggregate is empty".to_string())
    })?;
    chronological_split(aggregate, cutoff_months_before(last, months)?)
}

/// Partition at `cutoff`; fails if either side would be empty
pub fn chronological_split(
    aggregate: &DailyAggregate,
    cutoff: NaiveDate,
) -> Result<ChronologicalSplit> {
    let train = aggregate.filter(|o| o.date <= cutoff);
    let test = aggregate.filter(|o| o.date > cutoff);

    if train.is_empty() {
        return Err(ForecastError::InsufficientData(format!(
            "No observations on or before cutoff {}",
            cutoff
        )));
    }
    if test.is_empty() {
        return Err(ForecastError::InsufficientData(format!(
            "No observations after cutoff {}",
            cutoff
        )));
    }

    tracing::debug!(
        %cutoff,
        train = train.len(),
        test = test.len(),
        "chronological split"
    );

    Ok(ChronologicalSplit {
        cutoff,
        train,
        test,
    })
}
