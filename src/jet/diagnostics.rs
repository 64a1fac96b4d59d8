//! Per-cell diagnostics hook.
//!
//! The tracker calls a `DiagnosticsSink` for every cell it processes, passing
//! everything that went into the decision explicitly. Sinks observe only: they
//! cannot change a result. Calls arrive from rayon worker threads in no
//! particular order.

use crate::domain::Hemisphere;
use crate::fit::{FitFailure, JetChoice, ProfileFit};

/// Everything known about one `(hemisphere, time, column)` cell.
#[derive(Debug, Clone, Copy)]
pub struct CellDiagnostic<'a> {
    pub hemisphere: Hemisphere,
    pub time_index: usize,
    pub time_value: f64,
    pub column: usize,
    /// Hemisphere latitudes, storage order.
    pub lat: &'a [f64],
    /// Theta on the tropopause at `lat`.
    pub profile: &'a [f64],
    /// Tropopause minus surface zonal wind at `lat`.
    pub shear: &'a [f64],
    pub fit: Result<&'a ProfileFit, FitFailure>,
    pub candidates: &'a [usize],
    pub choice: Option<JetChoice>,
}

pub trait DiagnosticsSink: Send + Sync {
    /// Cheap pre-filter so the tracker can skip building a diagnostic.
    fn wants(&self, hemisphere: Hemisphere, time_index: usize, column: usize) -> bool {
        let _ = (hemisphere, time_index, column);
        true
    }

    fn record(&self, cell: &CellDiagnostic<'_>);
}
