//! Aggregator binary.
//!
//! Processes the single calendar day given on the command line: fetches its raw telemetry,
//! aggregates it into fixed-width windows and loads the values not stored yet. Exits with a
//! non-zero status when the run fails.

use std::process::ExitCode;

use clap::Parser;
use config::shared::AggregatorConfig;
use etl::types::PartitionDate;
use telemetry::init_tracing;
use tracing::{error, info};

use crate::configuration::load_aggregator_config;
use crate::core::run_with_config;
use crate::error::{AggregatorError, AggregatorResult};

mod configuration;
mod core;
mod error;

#[derive(Debug, Parser)]
#[command(version, about = "Aggregates one day of raw wind telemetry into signals")]
struct Args {
    /// Day to process, formatted as YYYY-MM-DD.
    date: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> AggregatorResult<()> {
    let aggregator_config = load_aggregator_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(AggregatorError::config)?;

    // Rejected here, before the source or the store are built.
    let partition_date = PartitionDate::parse(&args.date)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(aggregator_config, partition_date))
}

async fn async_main(
    aggregator_config: AggregatorConfig,
    partition_date: PartitionDate,
) -> AggregatorResult<()> {
    match run_with_config(aggregator_config, partition_date).await {
        Ok(summary) => {
            info!(
                %partition_date,
                windows = summary.windows,
                written = summary.load.written,
                "aggregator finished"
            );

            Ok(())
        }
        Err(err) => {
            error!(%partition_date, "{err}");

            Err(err)
        }
    }
}
