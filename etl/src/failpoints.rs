use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Triggered after signals are registered and before aggregates are loaded.
pub const PIPELINE_RUN__BEFORE_LOAD: &str = "pipeline_run.before_load";

/// Triggered right before the loader issues its batch write.
pub const LOADER__BEFORE_BATCH_WRITE: &str = "loader.before_batch_write";

/// Evaluates the failpoint `name`, returning an error when it is configured to `return`.
///
/// A no-op unless the `failpoints` feature is enabled.
pub fn etl_fail_point(name: &str) -> EtlResult<()> {
    fail_point!(name, |_| {
        bail!(
            ErrorKind::WithFailpoint,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
