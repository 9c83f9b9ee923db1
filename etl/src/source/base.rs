use std::future::Future;

use crate::error::EtlResult;
use crate::types::{PartitionDate, RawTable};

/// A queryable store of raw time-series observations.
///
/// Implementations return the observations of one calendar day restricted to the requested
/// variables. A day without any observation is reported as
/// [`crate::error::ErrorKind::SourceNoData`], distinct from the source being unreachable
/// ([`crate::error::ErrorKind::SourceConnectionFailed`]) or failing the request
/// ([`crate::error::ErrorKind::SourceRequestFailed`]).
pub trait RawDataSource {
    /// Returns the name of the source, used in logs.
    fn name() -> &'static str;

    /// Fetches the observations stamped within `date` for `variables`.
    fn fetch(
        &self,
        date: PartitionDate,
        variables: &[String],
    ) -> impl Future<Output = EtlResult<RawTable>> + Send;
}
