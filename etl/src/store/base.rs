use std::collections::BTreeMap;
use std::future::Future;

use chrono::NaiveDateTime;

use crate::error::EtlResult;
use crate::types::{AggregateDataPoint, SignalId};

/// Persistent store of signals and their aggregated values.
///
/// A store holds two relations: signals, mapping a unique name to an id the store assigns, and
/// data points, unique per `(timestamp, signal id)` and referencing an existing signal.
pub trait AggregateStore {
    /// Returns every known signal name with its id.
    fn load_signals(&self) -> impl Future<Output = EtlResult<BTreeMap<String, SignalId>>> + Send;

    /// Creates the signal `name` and returns its id.
    ///
    /// If another writer created the signal first, its existing id is returned instead.
    fn create_signal(&self, name: &str) -> impl Future<Output = EtlResult<SignalId>> + Send;

    /// Returns `true` if a data point is stored for `signal_id` at `timestamp`.
    fn aggregate_exists(
        &self,
        timestamp: NaiveDateTime,
        signal_id: SignalId,
    ) -> impl Future<Output = EtlResult<bool>> + Send;

    /// Writes `points` atomically and returns how many rows were written.
    ///
    /// Points whose key is already stored are left untouched and not counted. Either every
    /// remaining point is written or none is.
    fn insert_aggregates(
        &self,
        points: Vec<AggregateDataPoint>,
    ) -> impl Future<Output = EtlResult<u64>> + Send;
}
