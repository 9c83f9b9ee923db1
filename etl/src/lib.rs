//! Daily aggregation of raw wind telemetry into named signals.
//!
//! A [`pipeline::Pipeline`] fetches one day of raw observations from a
//! [`source::RawDataSource`], groups them into fixed-width windows with a
//! [`resample::Resampler`], registers the resulting signal names through
//! [`registry::ensure_signals`] and loads values not stored yet with
//! [`loader::load_aggregates`] into an [`store::AggregateStore`].

mod macros;

pub mod error;
pub mod failpoints;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod resample;
pub mod source;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
