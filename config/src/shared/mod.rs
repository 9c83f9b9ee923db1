mod aggregator;
mod base;
mod connection;
mod pipeline;
mod source;

pub use aggregator::*;
pub use base::*;
pub use connection::*;
pub use pipeline::*;
pub use source::*;
