use config::load_config;
use config::shared::AggregatorConfig;

use crate::error::{AggregatorError, AggregatorResult};

/// Loads the aggregator configuration from `configuration/` and validates it.
pub fn load_aggregator_config() -> AggregatorResult<AggregatorConfig> {
    let config = load_config::<AggregatorConfig>().map_err(AggregatorError::config)?;
    config.validate().map_err(AggregatorError::config)?;

    Ok(config)
}
