//! End-to-end run: provider, aggregate, tabular selection, sequence passes

use crate::config::PipelineConfig;
use crate::data::MergedDatasetProvider;
use crate::error::Result;
use crate::features::{daily_aggregate, DailyAggregate};
use crate::selector::{SelectionReport, TabularForecastSelector};
use crate::sequence::{SequenceForecaster, SequenceReport};

/// Everything a pipeline run produced
#[derive(Debug)]
pub struct PipelineReport {
    pub aggregate: DailyAggregate,
    pub tabular: SelectionReport,
    pub sequence: SequenceReport,
}

/// Runs both forecasters over one derived daily aggregate
#[derive(Debug)]
pub struct ForecastPipeline {
    selector: TabularForecastSelector,
    sequence: SequenceForecaster,
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selector: TabularForecastSelector::new(config.selector)?,
            sequence: SequenceForecaster::new(config.sequence)?,
        })
    }

    pub fn selector(&self) -> &TabularForecastSelector {
        &self.selector
    }

    pub fn sequence(&self) -> &SequenceForecaster {
        &self.sequence
    }

    /// Load the merged table once and run both forecasters on its aggregate
    pub fn run<P>(&self, provider: &P) -> Result<PipelineReport>
    where
        P: MergedDatasetProvider + ?Sized,
    {
        let table = provider.get_merged_transactions()?;
        let aggregate = daily_aggregate(&table)?;
        tracing::info!(
            days = aggregate.len(),
            first = ?aggregate.first_date(),
            last = ?aggregate.last_date(),
            "derived daily aggregate"
        );
        self.run_on_aggregate(aggregate)
    }

    /// Run both forecasters on an already derived aggregate
    pub fn run_on_aggregate(&self, aggregate: DailyAggregate) -> Result<PipelineReport> {
        let tabular = self.selector.run(&aggregate)?;
        let sequence = self.sequence.run(&aggregate)?;

        Ok(PipelineReport {
            aggregate,
            tabular,
            sequence,
        })
    }
}
