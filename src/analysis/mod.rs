//! Aggregation over record slices.

pub mod aggregator;

pub use aggregator::*;
