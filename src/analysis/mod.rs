//! Analysis modules.
//!
//! Aggregation of post records into per-channel statistics.

pub mod aggregator;

pub use aggregator::*;
