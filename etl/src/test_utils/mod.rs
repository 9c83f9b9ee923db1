//! Helpers for testing runs against in-memory sources and stores.
//!
//! [`fixtures`] builds raw observations for common day layouts, [`fault_store`] wraps a store to
//! make chosen operations fail and [`failpoints`] configures the crate's failpoints for the
//! lifetime of a test. [`database`] creates throwaway Postgres databases for the store tests.

pub mod database;
pub mod failpoints;
pub mod fault_store;
pub mod fixtures;
