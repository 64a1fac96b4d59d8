//! Jet position series.
//!
//! A `JetRecord` holds, per hemisphere, three co-indexed `(time, column)`
//! arrays: jet latitude, theta on the tropopause at the jet, and zonal wind
//! on the tropopause at the jet. A column is a longitude, or the single zonal
//! median column. Missing samples are NaN; `mask()` exposes them explicitly.
//!
//! Records only grow through `merge`, which concatenates along time.

use std::ops::AddAssign;

use ndarray::{Array2, Axis, concatenate};
use serde::{Deserialize, Serialize};

use crate::domain::{Hemisphere, ZonalMode};
use crate::error::JetError;
use crate::grid::TimeAxis;

/// The three output quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Latitude,
    Theta,
    Intensity,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] =
        [SeriesKind::Latitude, SeriesKind::Theta, SeriesKind::Intensity];

    pub fn name(self) -> &'static str {
        match self {
            SeriesKind::Latitude => "jet_latitude",
            SeriesKind::Theta => "jet_theta",
            SeriesKind::Intensity => "jet_intensity",
        }
    }

    pub fn units(self) -> &'static str {
        match self {
            SeriesKind::Latitude => "degrees_north",
            SeriesKind::Theta => "K",
            SeriesKind::Intensity => "m s-1",
        }
    }

    /// `lat_sh`, `theta_nh`, `intens_sh`, ...
    pub fn short_name(self, hemisphere: Hemisphere) -> String {
        let prefix = match self {
            SeriesKind::Latitude => "lat",
            SeriesKind::Theta => "theta",
            SeriesKind::Intensity => "intens",
        };
        format!("{prefix}_{}", hemisphere.short_suffix())
    }
}

/// Outcome counters for the cells of one hemisphere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStats {
    pub cells: usize,
    pub missing: usize,
    /// Whole profile without a tropopause crossing.
    pub no_surface: usize,
    pub fit_failed: usize,
    pub rank_deficient: usize,
    pub no_candidates: usize,
    /// Cells decided among several candidates.
    pub tie_breaks: usize,
}

impl AddAssign for CellStats {
    fn add_assign(&mut self, rhs: Self) {
        self.cells += rhs.cells;
        self.missing += rhs.missing;
        self.no_surface += rhs.no_surface;
        self.fit_failed += rhs.fit_failed;
        self.rank_deficient += rhs.rank_deficient;
        self.no_candidates += rhs.no_candidates;
        self.tie_breaks += rhs.tie_breaks;
    }
}

/// Jet series of one hemisphere, `(time, column)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereSeries {
    pub lat: Array2<f64>,
    pub theta: Array2<f64>,
    pub intensity: Array2<f64>,
    pub stats: CellStats,
}

impl HemisphereSeries {
    /// All-missing series.
    pub fn missing(n_time: usize, n_col: usize) -> Self {
        Self {
            lat: Array2::from_elem((n_time, n_col), f64::NAN),
            theta: Array2::from_elem((n_time, n_col), f64::NAN),
            intensity: Array2::from_elem((n_time, n_col), f64::NAN),
            stats: CellStats::default(),
        }
    }

    pub fn get(&self, kind: SeriesKind) -> &Array2<f64> {
        match kind {
            SeriesKind::Latitude => &self.lat,
            SeriesKind::Theta => &self.theta,
            SeriesKind::Intensity => &self.intensity,
        }
    }

    /// `true` where no jet was found.
    pub fn mask(&self) -> Array2<bool> {
        self.lat.mapv(|v| !v.is_finite())
    }

    pub fn n_valid(&self) -> usize {
        self.lat.iter().filter(|v| v.is_finite()).count()
    }

    fn concat(&self, next: &HemisphereSeries) -> Result<HemisphereSeries, JetError> {
        let join = |a: &Array2<f64>, b: &Array2<f64>| {
            concatenate(Axis(0), &[a.view(), b.view()]).map_err(|e| JetError::MergeMismatch {
                reason: e.to_string(),
            })
        };
        let mut stats = self.stats;
        stats += next.stats;
        Ok(HemisphereSeries {
            lat: join(&self.lat, &next.lat)?,
            theta: join(&self.theta, &next.theta)?,
            intensity: join(&self.intensity, &next.intensity)?,
            stats,
        })
    }
}

/// Jet series for both hemispheres over a span of time.
#[derive(Debug, Clone, PartialEq)]
pub struct JetRecord {
    pub time: TimeAxis,
    /// Longitudes of the columns; `None` for zonal-median output or zonally
    /// averaged input.
    pub lon: Option<Vec<f64>>,
    pub zonal_mode: ZonalMode,
    pub south: HemisphereSeries,
    pub north: HemisphereSeries,
}

impl JetRecord {
    /// A record with no time steps. Merging with it is a no-op.
    pub fn empty(
        units: impl Into<String>,
        calendar: impl Into<String>,
        zonal_mode: ZonalMode,
        lon: Option<Vec<f64>>,
    ) -> Self {
        let n_col = lon.as_ref().map_or(1, Vec::len);
        Self {
            time: TimeAxis::new(Vec::new(), units, calendar),
            lon,
            zonal_mode,
            south: HemisphereSeries::missing(0, n_col),
            north: HemisphereSeries::missing(0, n_col),
        }
    }

    pub fn hemisphere(&self, hemisphere: Hemisphere) -> &HemisphereSeries {
        match hemisphere {
            Hemisphere::South => &self.south,
            Hemisphere::North => &self.north,
        }
    }

    pub fn n_columns(&self) -> usize {
        self.south.lat.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Concatenate `next` after `self` along time.
    ///
    /// Both records must share the zonal mode, the longitudes and the time
    /// encoding, and `next` must start strictly after `self` ends. An empty
    /// record on either side returns the other unchanged.
    pub fn merge(self, next: JetRecord) -> Result<JetRecord, JetError> {
        if next.is_empty() {
            return Ok(self);
        }
        if self.is_empty() {
            return Ok(next);
        }
        if self.zonal_mode != next.zonal_mode {
            return Err(JetError::MergeMismatch {
                reason: format!("zonal mode {} vs {}", self.zonal_mode, next.zonal_mode),
            });
        }
        if self.lon != next.lon {
            return Err(JetError::MergeMismatch {
                reason: "longitude coordinates differ".to_string(),
            });
        }
        if self.time.units != next.time.units || self.time.calendar != next.time.calendar {
            return Err(JetError::MergeMismatch {
                reason: format!(
                    "time encoding '{}' ({}) vs '{}' ({})",
                    self.time.units, self.time.calendar, next.time.units, next.time.calendar
                ),
            });
        }
        let last = self.time.values[self.time.len() - 1];
        let first = next.time.values[0];
        if last >= first {
            return Err(JetError::ChunkOverlap { last, next: first });
        }

        let mut values = self.time.values.clone();
        values.extend_from_slice(&next.time.values);
        Ok(JetRecord {
            time: TimeAxis::new(values, self.time.units.clone(), self.time.calendar.clone()),
            south: self.south.concat(&next.south)?,
            north: self.north.concat(&next.north)?,
            lon: self.lon,
            zonal_mode: self.zonal_mode,
        })
    }
}
