//! Insert-if-absent loading of aggregated tables into an aggregate store.

use tracing::{debug, info};

use crate::error::EtlResult;
use crate::failpoints::{LOADER__BEFORE_BATCH_WRITE, etl_fail_point};
use crate::registry::SignalMap;
use crate::store::AggregateStore;
use crate::types::{AggregateDataPoint, AggregatedTable};

/// Outcome of loading one aggregated table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Present cells of the table.
    pub candidates: usize,
    /// Cells already stored before the load started.
    pub skipped_existing: usize,
    /// Cells handed to the batch write.
    pub staged: usize,
    /// Rows the store reported as written.
    pub written: u64,
}

/// Loads every present cell of `table` that the store does not hold yet.
///
/// Stored values are never overwritten. All staged points go out in a single batch write, and
/// no write is issued when nothing is staged. Every signal name of the table must be in
/// `signals`, a missing one fails the load before anything is written.
pub async fn load_aggregates<St>(
    store: &St,
    table: &AggregatedTable,
    signals: &SignalMap,
) -> EtlResult<LoadSummary>
where
    St: AggregateStore,
{
    let mut summary = LoadSummary::default();
    let mut staged = Vec::new();

    for (timestamp, name, value) in table.cells() {
        summary.candidates += 1;

        let signal_id = signals.resolve(name)?;
        if store.aggregate_exists(timestamp, signal_id).await? {
            summary.skipped_existing += 1;
            continue;
        }

        staged.push(AggregateDataPoint {
            timestamp,
            signal_id,
            value,
        });
    }

    summary.staged = staged.len();
    debug!(
        candidates = summary.candidates,
        skipped_existing = summary.skipped_existing,
        staged = summary.staged,
        "staged aggregates"
    );

    if staged.is_empty() {
        info!("all aggregates already loaded, nothing to write");

        return Ok(summary);
    }

    etl_fail_point(LOADER__BEFORE_BATCH_WRITE)?;

    summary.written = store.insert_aggregates(staged).await?;
    info!(written = summary.written, "aggregates written");

    Ok(summary)
}
