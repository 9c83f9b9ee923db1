use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::source::RawDataSource;
use crate::types::{PartitionDate, RawObservation, RawTable};

#[derive(Debug, Default)]
struct Inner {
    observations: Vec<RawObservation>,
    fetches: Vec<PartitionDate>,
}

/// Raw data source serving observations held in memory.
///
/// Answers like the HTTP source would: only observations of the requested day and variables are
/// returned, and a day without observations fails with [`ErrorKind::SourceNoData`]. Clones share
/// the same observations.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySource {
    pub fn new(observations: Vec<RawObservation>) -> Self {
        let inner = Inner {
            observations,
            fetches: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Dates requested so far, in call order.
    pub async fn fetches(&self) -> Vec<PartitionDate> {
        let inner = self.inner.lock().await;

        inner.fetches.clone()
    }
}

impl RawDataSource for MemorySource {
    fn name() -> &'static str {
        "memory"
    }

    async fn fetch(&self, date: PartitionDate, variables: &[String]) -> EtlResult<RawTable> {
        let mut inner = self.inner.lock().await;
        inner.fetches.push(date);

        let observations: Vec<RawObservation> = inner
            .observations
            .iter()
            .filter(|observation| date.contains(observation.timestamp))
            .map(|observation| {
                let mut filtered = RawObservation::new(observation.timestamp);
                for variable in variables {
                    if let Some(value) = observation.value(variable) {
                        filtered = filtered.with_value(variable.as_str(), value);
                    }
                }
                filtered
            })
            .collect();

        if observations.is_empty() {
            bail!(
                ErrorKind::SourceNoData,
                "No data returned from source",
                format!("no observations held for {date}")
            );
        }

        RawTable::new(observations)
    }
}
