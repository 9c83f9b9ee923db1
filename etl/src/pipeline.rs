use config::shared::PipelineConfig;
use tracing::{Instrument, debug, info, info_span};

use crate::error::EtlResult;
use crate::failpoints::{PIPELINE_RUN__BEFORE_LOAD, etl_fail_point};
use crate::loader::{LoadSummary, load_aggregates};
use crate::registry::ensure_signals;
use crate::resample::Resampler;
use crate::source::RawDataSource;
use crate::store::AggregateStore;
use crate::types::PartitionDate;

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub partition_date: PartitionDate,
    /// Raw observations fetched for the day.
    pub observations: usize,
    /// Windows holding at least one aggregated value.
    pub windows: usize,
    /// Signals registered for the run.
    pub signals: usize,
    pub load: LoadSummary,
}

/// Turns one day of raw observations into stored aggregates.
///
/// A run goes through parse, fetch, resample, register and load, stopping at the first failure
/// and returning it as is. Runs are never retried here. Running the same day again is safe,
/// values already stored are kept.
#[derive(Debug)]
pub struct Pipeline<Src, St> {
    resampler: Resampler,
    source: Src,
    store: St,
}

impl<Src, St> Pipeline<Src, St>
where
    Src: RawDataSource,
    St: AggregateStore,
{
    /// Fails with [`crate::error::ErrorKind::ConfigError`] if the window width or an
    /// aggregation name of `config` is invalid.
    pub fn new(config: PipelineConfig, source: Src, store: St) -> EtlResult<Self> {
        let resampler = Resampler::from_config(&config)?;

        Ok(Self::with_resampler(resampler, source, store))
    }

    /// Runs with an already built `resampler`, e.g. one holding custom aggregation functions.
    pub fn with_resampler(resampler: Resampler, source: Src, store: St) -> Self {
        Self {
            resampler,
            source,
            store,
        }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    /// Processes the day given as `YYYY-MM-DD`.
    ///
    /// A malformed date fails with [`crate::error::ErrorKind::InvalidPartitionDate`] before the
    /// source or the store is touched.
    pub async fn run(&self, partition_date: &str) -> EtlResult<RunSummary> {
        let span = info_span!("etl_run", partition_date);

        self.run_steps(partition_date).instrument(span).await
    }

    async fn run_steps(&self, partition_date: &str) -> EtlResult<RunSummary> {
        let date = PartitionDate::parse(partition_date)?;
        info!(%date, source = Src::name(), "starting aggregation run");

        let raw = self.source.fetch(date, self.resampler.variables()).await?;
        debug!(
            observations = raw.len(),
            first = ?raw.first_timestamp(),
            last = ?raw.last_timestamp(),
            "fetched raw observations"
        );

        let table = self.resampler.resample(&raw)?;
        debug!(
            windows = table.len(),
            cells = table.cell_count(),
            "resampled raw observations"
        );

        let aggregations = self.resampler.aggregations().names();
        let signals = ensure_signals(&self.store, self.resampler.variables(), &aggregations).await?;

        etl_fail_point(PIPELINE_RUN__BEFORE_LOAD)?;

        let load = load_aggregates(&self.store, &table, &signals).await?;

        let summary = RunSummary {
            partition_date: date,
            observations: raw.len(),
            windows: table.len(),
            signals: signals.len(),
            load,
        };
        info!(
            %date,
            windows = summary.windows,
            written = summary.load.written,
            skipped = summary.load.skipped_existing,
            "aggregation run completed"
        );

        Ok(summary)
    }
}
