//! Resolution of signal names to the ids the aggregate store assigned them.

use std::collections::BTreeMap;
use std::collections::btree_map;

use tracing::{debug, info};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::store::AggregateStore;
use crate::types::{SignalId, signal_name};

/// Mapping from signal name to signal id for the combinations a run produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalMap {
    signals: BTreeMap<String, SignalId>,
}

impl SignalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, signal_id: SignalId) {
        self.signals.insert(name.into(), signal_id);
    }

    pub fn get(&self, name: &str) -> Option<SignalId> {
        self.signals.get(name).copied()
    }

    /// Like [`SignalMap::get`], failing with [`ErrorKind::MissingSignalMapping`] for unknown names.
    pub fn resolve(&self, name: &str) -> EtlResult<SignalId> {
        match self.get(name) {
            Some(signal_id) => Ok(signal_id),
            None => bail!(
                ErrorKind::MissingSignalMapping,
                "Signal is not registered",
                format!("no signal id is known for '{name}'")
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SignalId)> + '_ {
        self.signals
            .iter()
            .map(|(name, signal_id)| (name.as_str(), *signal_id))
    }
}

impl FromIterator<(String, SignalId)> for SignalMap {
    fn from_iter<I: IntoIterator<Item = (String, SignalId)>>(iter: I) -> Self {
        Self {
            signals: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SignalMap {
    type Item = (String, SignalId);
    type IntoIter = btree_map::IntoIter<String, SignalId>;

    fn into_iter(self) -> Self::IntoIter {
        self.signals.into_iter()
    }
}

/// Makes sure a signal exists for every `variable` × `aggregation` combination.
///
/// Existing signals are loaded once. Missing ones are created one at a time, each persisted
/// before the next is looked at. The returned map covers every requested combination and
/// nothing else.
pub async fn ensure_signals<St, V, A>(
    store: &St,
    variables: &[V],
    aggregations: &[A],
) -> EtlResult<SignalMap>
where
    St: AggregateStore,
    V: AsRef<str>,
    A: AsRef<str>,
{
    let existing = store.load_signals().await?;
    debug!(existing = existing.len(), "loaded existing signals");

    let mut signals = SignalMap::new();
    let mut created = 0;
    for variable in variables {
        for aggregation in aggregations {
            let name = signal_name(variable.as_ref(), aggregation.as_ref());
            if signals.get(&name).is_some() {
                continue;
            }

            let signal_id = match existing.get(&name) {
                Some(signal_id) => *signal_id,
                None => {
                    created += 1;
                    store.create_signal(&name).await?
                }
            };
            signals.insert(name, signal_id);
        }
    }

    info!(signals = signals.len(), created, "signals registered");

    Ok(signals)
}
