//! Coordinates and gridded input fields.

pub mod axis;
pub mod field;
pub mod time;

pub use axis::*;
pub use field::*;
pub use time::*;
