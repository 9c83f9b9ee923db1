use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::store::AggregateStore;
use crate::types::{AggregateDataPoint, SignalId};

/// How a faulty store operation misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultType {
    /// Fails with the given error kind without reaching the wrapped store.
    Error(ErrorKind),
    Panic,
}

/// Fault to inject per store operation, operations without one are forwarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultConfig {
    pub load_signals: Option<FaultType>,
    pub create_signal: Option<FaultType>,
    pub aggregate_exists: Option<FaultType>,
    pub insert_aggregates: Option<FaultType>,
}

/// Aggregate store wrapper failing the operations selected in its [`FaultConfig`].
#[derive(Debug, Clone)]
pub struct FaultInjectingStore<S> {
    inner: S,
    config: FaultConfig,
}

impl<S> FaultInjectingStore<S> {
    pub fn wrap(inner: S, config: FaultConfig) -> Self {
        Self { inner, config }
    }

    pub fn get_inner(&self) -> &S {
        &self.inner
    }

    fn trigger(fault: Option<FaultType>, operation: &'static str) -> EtlResult<()> {
        match fault {
            None => Ok(()),
            Some(FaultType::Panic) => panic!("injected panic in {operation}"),
            Some(FaultType::Error(kind)) => bail!(
                kind,
                "Injected aggregate store fault",
                format!("{operation} was configured to fail")
            ),
        }
    }
}

impl<S> AggregateStore for FaultInjectingStore<S>
where
    S: AggregateStore + Sync,
{
    async fn load_signals(&self) -> EtlResult<BTreeMap<String, SignalId>> {
        Self::trigger(self.config.load_signals, "load_signals")?;

        self.inner.load_signals().await
    }

    async fn create_signal(&self, name: &str) -> EtlResult<SignalId> {
        Self::trigger(self.config.create_signal, "create_signal")?;

        self.inner.create_signal(name).await
    }

    async fn aggregate_exists(
        &self,
        timestamp: NaiveDateTime,
        signal_id: SignalId,
    ) -> EtlResult<bool> {
        Self::trigger(self.config.aggregate_exists, "aggregate_exists")?;

        self.inner.aggregate_exists(timestamp, signal_id).await
    }

    async fn insert_aggregates(&self, points: Vec<AggregateDataPoint>) -> EtlResult<u64> {
        Self::trigger(self.config.insert_aggregates, "insert_aggregates")?;

        self.inner.insert_aggregates(points).await
    }
}
