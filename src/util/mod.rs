//! A set of utility functions used around the pipeline.

#[macro_use]
pub mod number;
pub mod round;
