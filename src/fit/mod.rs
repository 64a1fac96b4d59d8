//! Per-cell profile fitting and jet selection.
//!
//! Responsibilities:
//!
//! - fit theta-on-tropopause against latitude and differentiate it
//! - find derivative extrema poleward of `min_lat`
//! - break ties between candidates with the wind shear

pub mod fitter;
pub mod selection;

pub use fitter::*;
pub use selection::*;
