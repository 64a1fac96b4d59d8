//! Synthetic input data.

pub mod sample;
