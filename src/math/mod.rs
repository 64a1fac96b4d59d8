//! Mathematical utilities: polynomial bases, least squares, extrema, medians.

pub mod basis;
pub mod extrema;
pub mod ols;
pub mod stats;

pub use basis::*;
pub use extrema::*;
pub use ols::*;
pub use stats::*;
