//! Reporting utilities: per-hemisphere run summaries and terminal output.

use crate::domain::Hemisphere;
use crate::jet::{CellStats, JetRecord};
use crate::math::nan_median;

pub mod format;

pub use format::*;

/// Headline numbers for one hemisphere of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereSummary {
    pub hemisphere: Hemisphere,
    pub n_valid: usize,
    pub n_missing: usize,
    pub median_lat: Option<f64>,
    /// Equatorward-most and poleward-most jet latitude found.
    pub lat_range: Option<(f64, f64)>,
    pub median_intensity: Option<f64>,
    pub stats: CellStats,
}

/// Summarize both hemispheres, south first.
pub fn summarize(record: &JetRecord) -> Vec<HemisphereSummary> {
    Hemisphere::ALL
        .into_iter()
        .map(|hemisphere| {
            let series = record.hemisphere(hemisphere);
            let n_valid = series.n_valid();
            let lat_range = series
                .lat
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                    None => Some((v, v)),
                    Some((lo, hi)) if v.abs() < lo.abs() => Some((v, hi)),
                    Some((lo, hi)) if v.abs() > hi.abs() => Some((lo, v)),
                    keep => keep,
                });
            HemisphereSummary {
                hemisphere,
                n_valid,
                n_missing: series.lat.len() - n_valid,
                median_lat: nan_median(series.lat.iter().copied()),
                lat_range,
                median_intensity: nan_median(series.intensity.iter().copied()),
                stats: series.stats,
            }
        })
        .collect()
}
