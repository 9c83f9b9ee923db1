use std::collections::HashSet;

use serde::Deserialize;

use crate::shared::{KNOWN_SOURCE_VARIABLES, ValidationError};

/// Number of seconds in one calendar day, the span of a single pipeline run.
const SECONDS_PER_DAY: u64 = 86_400;

/// Aggregation settings of the daily pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Width of an aggregation window in seconds. Must tile a day exactly.
    #[serde(default = "default_window_width_secs")]
    pub window_width_secs: u64,
    /// Source variables to fetch and aggregate.
    #[serde(default = "default_variables")]
    pub variables: Vec<String>,
    /// Names of the aggregation functions applied to every variable.
    #[serde(default = "default_aggregations")]
    pub aggregations: Vec<String>,
}

impl PipelineConfig {
    pub const DEFAULT_WINDOW_WIDTH_SECS: u64 = 600;
    pub const DEFAULT_VARIABLES: &'static [&'static str] = &["wind_speed", "power"];
    pub const DEFAULT_AGGREGATIONS: &'static [&'static str] = &["mean", "min", "max", "std"];

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.window_width_secs == 0 || SECONDS_PER_DAY % self.window_width_secs != 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.window_width_secs".to_string(),
                constraint: format!("must be a non-zero divisor of {SECONDS_PER_DAY}"),
            });
        }

        validate_names("pipeline.variables", &self.variables)?;
        validate_names("pipeline.aggregations", &self.aggregations)?;

        if let Some(unknown) = self
            .variables
            .iter()
            .find(|variable| !KNOWN_SOURCE_VARIABLES.contains(&variable.as_str()))
        {
            return Err(ValidationError::UnknownVariable(unknown.clone()));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_width_secs: default_window_width_secs(),
            variables: default_variables(),
            aggregations: default_aggregations(),
        }
    }
}

fn validate_names(field: &str, names: &[String]) -> Result<(), ValidationError> {
    if names.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: field.to_string(),
                constraint: "entries cannot be blank".to_string(),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicateEntry {
                field: field.to_string(),
                value: name.clone(),
            });
        }
    }

    Ok(())
}

fn default_window_width_secs() -> u64 {
    PipelineConfig::DEFAULT_WINDOW_WIDTH_SECS
}

fn default_variables() -> Vec<String> {
    PipelineConfig::DEFAULT_VARIABLES
        .iter()
        .map(|variable| variable.to_string())
        .collect()
}

fn default_aggregations() -> Vec<String> {
    PipelineConfig::DEFAULT_AGGREGATIONS
        .iter()
        .map(|aggregation| aggregation.to_string())
        .collect()
}
