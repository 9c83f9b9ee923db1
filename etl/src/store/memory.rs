use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::store::AggregateStore;
use crate::types::{AggregateDataPoint, SignalId};

/// Inner state of [`MemoryStore`].
#[derive(Debug)]
struct Inner {
    signals: BTreeMap<String, SignalId>,
    /// Next id handed out by [`AggregateStore::create_signal`].
    next_signal_id: i64,
    data: BTreeMap<(NaiveDateTime, SignalId), f64>,
    /// Number of [`AggregateStore::insert_aggregates`] calls, successful or not.
    insert_calls: usize,
}

/// In-memory aggregate store.
///
/// Enforces the same constraints as the Postgres store: signal names are unique, data points
/// are unique per key and must reference an existing signal. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let inner = Inner {
            signals: BTreeMap::new(),
            next_signal_id: 1,
            data: BTreeMap::new(),
            insert_calls: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn signals(&self) -> BTreeMap<String, SignalId> {
        let inner = self.inner.lock().await;

        inner.signals.clone()
    }

    /// All stored data points, ordered by timestamp then signal id.
    pub async fn aggregates(&self) -> Vec<AggregateDataPoint> {
        let inner = self.inner.lock().await;

        inner
            .data
            .iter()
            .map(|(&(timestamp, signal_id), &value)| AggregateDataPoint {
                timestamp,
                signal_id,
                value,
            })
            .collect()
    }

    pub async fn get_aggregate(
        &self,
        timestamp: NaiveDateTime,
        signal_id: SignalId,
    ) -> Option<f64> {
        let inner = self.inner.lock().await;

        inner.data.get(&(timestamp, signal_id)).copied()
    }

    pub async fn insert_calls(&self) -> usize {
        let inner = self.inner.lock().await;

        inner.insert_calls
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateStore for MemoryStore {
    async fn load_signals(&self) -> EtlResult<BTreeMap<String, SignalId>> {
        let inner = self.inner.lock().await;

        Ok(inner.signals.clone())
    }

    async fn create_signal(&self, name: &str) -> EtlResult<SignalId> {
        let mut inner = self.inner.lock().await;

        if let Some(signal_id) = inner.signals.get(name) {
            return Ok(*signal_id);
        }

        let signal_id = SignalId(inner.next_signal_id);
        inner.next_signal_id += 1;
        inner.signals.insert(name.to_string(), signal_id);

        Ok(signal_id)
    }

    async fn aggregate_exists(
        &self,
        timestamp: NaiveDateTime,
        signal_id: SignalId,
    ) -> EtlResult<bool> {
        let inner = self.inner.lock().await;

        Ok(inner.data.contains_key(&(timestamp, signal_id)))
    }

    async fn insert_aggregates(&self, points: Vec<AggregateDataPoint>) -> EtlResult<u64> {
        let mut inner = self.inner.lock().await;
        inner.insert_calls += 1;

        // Checked upfront so that a violation leaves the store untouched.
        for point in &points {
            if !inner.signals.values().any(|id| *id == point.signal_id) {
                bail!(
                    ErrorKind::DestinationConstraintViolation,
                    "Aggregate store constraint violated",
                    format!("signal id {} does not exist", point.signal_id)
                );
            }
        }

        let mut written = 0;
        for point in points {
            let key = (point.timestamp, point.signal_id);
            if !inner.data.contains_key(&key) {
                inner.data.insert(key, point.value);
                written += 1;
            }
        }

        Ok(written)
    }
}
