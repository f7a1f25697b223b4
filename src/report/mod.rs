//! Series dump generation.

pub mod generator;

pub use generator::*;
