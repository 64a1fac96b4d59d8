//! Jet tracking: per-hemisphere search, output records, diagnostics hook.

pub mod diagnostics;
pub mod record;
pub mod tracker;

pub use diagnostics::*;
pub use record::*;
pub use tracker::*;
