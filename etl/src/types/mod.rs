//! Domain types flowing through a run: partition dates, raw observations, signals and
//! aggregated values.

mod aggregate;
mod date;
mod observation;

pub use aggregate::*;
pub use date::*;
pub use observation::*;
