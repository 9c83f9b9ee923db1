use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Aggregates the present values of one window. `None` means the result is absent.
///
/// Functions are only called with at least one value.
pub type AggregationFn = fn(&[f64]) -> Option<f64>;

/// Functions resolvable by name through [`Aggregations::from_names`].
const BUILTIN_AGGREGATIONS: &[(&str, AggregationFn)] = &[
    ("mean", mean),
    ("min", min),
    ("max", max),
    ("std", sample_std),
    ("var", sample_var),
    ("median", median),
    ("sum", sum),
    ("count", count),
];

/// Ordered set of named aggregation functions applied to every variable.
#[derive(Debug, Clone)]
pub struct Aggregations {
    entries: Vec<(String, AggregationFn)>,
}

impl Aggregations {
    /// An empty set, to be filled with [`Aggregations::register`].
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// `mean`, `min`, `max` and `std`.
    pub fn standard() -> Self {
        let mut aggregations = Self::empty();
        aggregations.register("mean", mean);
        aggregations.register("min", min);
        aggregations.register("max", max);
        aggregations.register("std", sample_std);
        aggregations
    }

    /// Resolves names against the built-in functions, keeping the given order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> EtlResult<Self> {
        let mut aggregations = Self::empty();

        for name in names {
            let name = name.as_ref();
            let Some((_, function)) = BUILTIN_AGGREGATIONS
                .iter()
                .find(|(builtin, _)| *builtin == name)
            else {
                let known = BUILTIN_AGGREGATIONS
                    .iter()
                    .map(|(builtin, _)| *builtin)
                    .collect::<Vec<_>>()
                    .join(", ");
                bail!(
                    ErrorKind::ConfigError,
                    "Unknown aggregation function",
                    format!("'{name}' is not one of: {known}")
                );
            };

            aggregations.register(name, *function);
        }

        Ok(aggregations)
    }

    /// Adds `function` under `name`, replacing a function already registered with that name.
    pub fn register(&mut self, name: impl Into<String>, function: AggregationFn) -> &mut Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = function,
            None => self.entries.push((name, function)),
        }
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AggregationFn)> + '_ {
        self.entries
            .iter()
            .map(|(name, function)| (name.as_str(), *function))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Aggregations {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Sample variance (denominator `n - 1`). Absent for fewer than two values.
pub fn sample_var(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let mean = mean(values)?;
    let squares = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>();

    Some(squares / (values.len() - 1) as f64)
}

/// Sample standard deviation (denominator `n - 1`). Absent for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_var(values).map(f64::sqrt)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[middle - 1] + sorted[middle]) / 2.0)
    } else {
        Some(sorted[middle])
    }
}

pub fn sum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum())
}

pub fn count(values: &[f64]) -> Option<f64> {
    Some(values.len() as f64)
}
