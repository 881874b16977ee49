//! Per-metric aggregators.
//!
//! Each submodule owns the row type(s) of one output table and the pure
//! reduction that builds rows from fetched collections. Fetching lives in
//! [`crate::harvest`]; nothing here does I/O.

pub mod commits;
pub mod deploy;
pub mod pulls;
pub mod summary;
pub mod tags;
