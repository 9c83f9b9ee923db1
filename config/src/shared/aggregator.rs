use serde::Deserialize;

use crate::Config;
use crate::shared::{PgConnectionConfig, PipelineConfig, SourceApiConfig, ValidationError};

/// Complete configuration of the aggregator service.
///
/// Loaded once at process start and handed to the pipeline explicitly. Not `Serialize`, since
/// it carries the aggregate store password.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Raw data source API.
    pub source: SourceApiConfig,
    /// Aggregate store receiving signals and aggregated data.
    pub target: PgConnectionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AggregatorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.target.validate()?;
        self.pipeline.validate()
    }
}

impl Config for AggregatorConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] =
        &["pipeline.variables", "pipeline.aggregations"];
}
