//! `stj-pv` library crate.
//!
//! Finds the latitude of the subtropical jet from the dynamical tropopause:
//! theta on the 2 PVU surface is fitted as a polynomial in latitude, and the
//! jet sits at the steepest poleward drop of that fit.
//!
//! The binary (`stj`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the tracker can be driven from other front-ends with their own I/O

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod grid;
pub mod interp;
pub mod io;
pub mod jet;
pub mod logging;
pub mod math;
pub mod report;
