use config::shared::AggregatorConfig;
use etl::pipeline::{Pipeline, RunSummary};
use etl::source::http::HttpSource;
use etl::store::postgres::PostgresStore;
use etl::types::PartitionDate;
use tracing::info;

use crate::error::AggregatorResult;

/// Runs the pipeline once for `partition_date` against the configured source and store.
///
/// The store connection is closed before returning, whether the run succeeded or not.
pub async fn run_with_config(
    config: AggregatorConfig,
    partition_date: PartitionDate,
) -> AggregatorResult<RunSummary> {
    info!(
        source_url = %config.source.url,
        target_host = %config.target.host,
        target_database = %config.target.name,
        window_width_secs = config.pipeline.window_width_secs,
        "starting aggregator"
    );

    let source = HttpSource::new(&config.source)?;
    let store = PostgresStore::new(&config.target);
    let pipeline = Pipeline::new(config.pipeline, source, store)?;

    let result = pipeline.run(&partition_date.to_string()).await;
    pipeline.store().close().await;

    Ok(result?)
}
