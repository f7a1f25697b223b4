//! Analysis modules.
//!
//! Splits into the per-cycle aggregator and the summary-statistics
//! primitives it reduces each cycle bucket with.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;
