//! Binning of raw observations into fixed-width windows and per-window aggregation.

mod aggregations;
mod resampler;

pub use aggregations::*;
pub use resampler::*;
