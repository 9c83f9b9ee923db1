use serde::Deserialize;

use crate::shared::ValidationError;

/// Variables the raw data source serves.
pub const KNOWN_SOURCE_VARIABLES: &[&str] = &["wind_speed", "power", "ambient_temperature"];

/// Location of the raw data source HTTP API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceApiConfig {
    /// Base URL of the API, e.g. `http://localhost:8000`. Requests go to `<url>/data`.
    pub url: String,
    /// Timeout applied to each request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceApiConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::EmptyField("source.url".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.timeout_secs".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    SourceApiConfig::DEFAULT_TIMEOUT_SECS
}
