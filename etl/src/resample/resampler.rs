use std::collections::BTreeMap;

use chrono::{DurationRound, NaiveDateTime, TimeDelta};
use config::shared::PipelineConfig;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::resample::Aggregations;
use crate::types::{AggregatedTable, RawTable, signal_name};

/// Groups raw observations into right-open windows of a fixed width and aggregates every
/// configured variable per window.
#[derive(Debug, Clone)]
pub struct Resampler {
    window: TimeDelta,
    variables: Vec<String>,
    aggregations: Aggregations,
}

impl Resampler {
    pub fn new(
        window: TimeDelta,
        variables: Vec<String>,
        aggregations: Aggregations,
    ) -> EtlResult<Self> {
        if window <= TimeDelta::zero() {
            bail!(
                ErrorKind::ConfigError,
                "Aggregation window width must be positive",
                format!("got {window}")
            );
        }

        if variables.is_empty() || aggregations.is_empty() {
            bail!(
                ErrorKind::ConfigError,
                "Resampler needs at least one variable and one aggregation"
            );
        }

        Ok(Self {
            window,
            variables,
            aggregations,
        })
    }

    /// Builds a resampler from the pipeline configuration, resolving aggregations by name.
    pub fn from_config(config: &PipelineConfig) -> EtlResult<Self> {
        let Ok(window_secs) = i64::try_from(config.window_width_secs) else {
            bail!(
                ErrorKind::ConfigError,
                "Aggregation window width is too large",
                format!("{} seconds", config.window_width_secs)
            );
        };

        Resampler::new(
            TimeDelta::seconds(window_secs),
            config.variables.clone(),
            Aggregations::from_names(&config.aggregations)?,
        )
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn aggregations(&self) -> &Aggregations {
        &self.aggregations
    }

    /// Start of the window `timestamp` belongs to.
    pub fn window_start(&self, timestamp: NaiveDateTime) -> EtlResult<NaiveDateTime> {
        Ok(timestamp.duration_trunc(self.window)?)
    }

    /// Aggregates `raw` into a table keyed by window start.
    ///
    /// Windows where a variable has no value produce nothing for that variable, and absent
    /// results (such as `std` over a single value) are left out.
    pub fn resample(&self, raw: &RawTable) -> EtlResult<AggregatedTable> {
        if raw.is_empty() {
            bail!(
                ErrorKind::InvalidData,
                "Cannot resample an empty raw table"
            );
        }

        let mut groups: BTreeMap<NaiveDateTime, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
        for observation in raw.observations() {
            let window_start = self.window_start(observation.timestamp)?;
            let group = groups.entry(window_start).or_default();

            for variable in &self.variables {
                if let Some(value) = observation.value(variable) {
                    group.entry(variable.as_str()).or_default().push(value);
                }
            }
        }

        let mut table = AggregatedTable::new();
        for (window_start, group) in &groups {
            for (variable, values) in group {
                for (aggregation, function) in self.aggregations.iter() {
                    if let Some(value) = function(values) {
                        table.insert(*window_start, signal_name(variable, aggregation), value);
                    }
                }
            }
        }

        Ok(table)
    }
}
