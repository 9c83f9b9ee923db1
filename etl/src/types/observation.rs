use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Naive timestamp layouts accepted from the raw data source, tried in order.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a source timestamp into a naive UTC instant.
///
/// Naive ISO-8601 values are taken as UTC. Values with an offset (RFC 3339) are converted to UTC.
pub fn parse_timestamp(value: &str) -> EtlResult<NaiveDateTime> {
    let value = value.trim();

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(timestamp);
        }
    }

    match DateTime::parse_from_rfc3339(value) {
        Ok(timestamp) => Ok(timestamp.naive_utc()),
        Err(err) => Err(crate::etl_error!(
            ErrorKind::InvalidSourceResponse,
            "Raw observation has an invalid timestamp",
            format!("'{value}' is not an ISO-8601 timestamp"),
            source: err
        )),
    }
}

/// One raw point of the source: a timestamp and the measurements present at that instant.
///
/// Measurements reported as null or NaN are not part of [`RawObservation::values`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub timestamp: NaiveDateTime,
    pub values: BTreeMap<String, f64>,
}

impl RawObservation {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Adds a measurement; NaN values are treated as missing and ignored.
    pub fn with_value(mut self, variable: impl Into<String>, value: f64) -> Self {
        if !value.is_nan() {
            self.values.insert(variable.into(), value);
        }
        self
    }

    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).copied()
    }
}

/// The raw observations of one run, ordered by timestamp.
///
/// Never empty: an empty fetch result is reported as [`ErrorKind::SourceNoData`] when building
/// the table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    observations: Vec<RawObservation>,
}

impl RawTable {
    pub fn new(mut observations: Vec<RawObservation>) -> EtlResult<Self> {
        if observations.is_empty() {
            bail!(ErrorKind::SourceNoData, "No data returned from source");
        }

        observations.sort_by_key(|observation| observation.timestamp);

        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[RawObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.observations.first().map(|observation| observation.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.observations.last().map(|observation| observation.timestamp)
    }
}
