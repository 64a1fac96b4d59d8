//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`Basis`, `ZonalMode`, `LevelKind`)
//! - the hemisphere split of the latitude axis (`Hemisphere`)
//! - jet search settings (`JetConfig`)

pub mod types;

pub use types::*;
