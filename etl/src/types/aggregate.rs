use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

/// Identifier the aggregate store assigned to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(pub i64);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the signal holding `aggregation` of `variable`, e.g. `wind_speed_mean`.
pub fn signal_name(variable: &str, aggregation: &str) -> String {
    format!("{variable}_{aggregation}")
}

/// One aggregated value of a signal, keyed by window start and signal id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateDataPoint {
    pub timestamp: NaiveDateTime,
    pub signal_id: SignalId,
    pub value: f64,
}

/// Output of the resampler: aggregated values by window start, then by signal name.
///
/// Sparse by construction. Absent results are never stored and windows without any
/// present value do not appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedTable {
    windows: BTreeMap<NaiveDateTime, BTreeMap<String, f64>>,
}

impl AggregatedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `signal` in the window starting at `window_start`.
    ///
    /// NaN values are dropped.
    pub fn insert(&mut self, window_start: NaiveDateTime, signal: impl Into<String>, value: f64) {
        if value.is_nan() {
            return;
        }

        self.windows
            .entry(window_start)
            .or_default()
            .insert(signal.into(), value);
    }

    pub fn get(&self, window_start: NaiveDateTime, signal: &str) -> Option<f64> {
        self.windows
            .get(&window_start)
            .and_then(|window| window.get(signal))
            .copied()
    }

    /// Window starts holding at least one value, in ascending order.
    pub fn windows(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.windows.keys().copied()
    }

    /// Values of a single window by signal name.
    pub fn window(&self, window_start: NaiveDateTime) -> Option<&BTreeMap<String, f64>> {
        self.windows.get(&window_start)
    }

    /// Every present cell as `(window start, signal name, value)`, ordered by window then name.
    pub fn cells(&self) -> impl Iterator<Item = (NaiveDateTime, &str, f64)> + '_ {
        self.windows.iter().flat_map(|(timestamp, window)| {
            window
                .iter()
                .map(move |(signal, value)| (*timestamp, signal.as_str(), *value))
        })
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Number of present cells over all windows.
    pub fn cell_count(&self) -> usize {
        self.windows.values().map(BTreeMap::len).sum()
    }
}
