//! Grid puzzle evaluation: dataset loading, sample voting and scoring.

mod aggregate;
mod dataset;
mod runner;

pub use aggregate::*;
pub use dataset::*;
pub use runner::*;
