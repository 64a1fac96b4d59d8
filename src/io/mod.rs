//! Input/output helpers.
//!
//! - JSON dataset read/write (`dataset`)
//! - jet record JSON read/write (`record`)
//! - long-format CSV export (`export`)

pub mod dataset;
pub mod export;
pub mod record;

pub use dataset::*;
pub use export::*;
pub use record::*;
