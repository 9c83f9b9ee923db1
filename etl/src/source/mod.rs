//! Sources of raw observations.

mod base;
pub mod http;
pub mod memory;

pub use base::RawDataSource;
