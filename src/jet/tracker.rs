//! Subtropical jet tracking on the dynamical tropopause.
//!
//! For each hemisphere the tracker:
//!
//! 1. interpolates theta and zonal wind onto the `±pv_value` PV surface
//! 2. computes the shear between that surface and the lowest level
//! 3. for every `(time, longitude)` cell, fits theta-on-tropopause against
//!    latitude poleward of `min_lat`, differentiates, and selects a jet
//!    latitude among the derivative extrema
//! 4. assembles latitude, theta and intensity series, either per longitude or
//!    as zonal medians over the longitudes where a jet was found
//!
//! Time steps run in parallel; the two hemispheres run concurrently.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array3, ArrayView1, Axis, s};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{Hemisphere, JetConfig, ZonalMode};
use crate::error::JetError;
use crate::fit::{FitFailure, ProfileFitter, fit_window, jet_candidates, select_jet};
use crate::grid::GriddedField;
use crate::interp::{Source, VerticalInterpolator};
use crate::jet::diagnostics::{CellDiagnostic, DiagnosticsSink};
use crate::jet::record::{CellStats, HemisphereSeries, JetRecord};
use crate::math::nan_median;

/// Progress is logged every this many time steps.
const PROGRESS_EVERY: usize = 50;

/// Finds the subtropical jet in gridded fields.
pub struct JetTracker<'s> {
    config: JetConfig,
    fitter: ProfileFitter,
    sink: Option<&'s dyn DiagnosticsSink>,
}

/// Hemisphere-wide inputs shared by every cell of one pass.
struct Pass {
    hemisphere: Hemisphere,
    lat: Vec<f64>,
    window: Range<usize>,
    time: Vec<f64>,
    /// `(time, lat, lon)` on the tropopause.
    theta_trop: Array3<f64>,
    u_trop: Array3<f64>,
    shear: Array3<f64>,
}

#[derive(Debug, Clone, Copy)]
struct CellOutcome {
    jet: Option<usize>,
    stats: CellStats,
}

impl<'s> JetTracker<'s> {
    pub fn new(config: JetConfig) -> Result<Self, JetError> {
        config.validate()?;
        Ok(Self {
            fitter: ProfileFitter::new(config.fit_deg, config.basis),
            config,
            sink: None,
        })
    }

    /// Report every cell to `sink`.
    pub fn with_diagnostics(mut self, sink: &'s dyn DiagnosticsSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Jet series for both hemispheres.
    pub fn run(&self, field: &GriddedField) -> JetRecord {
        let (south, north) = rayon::join(
            || self.find_jet(field, Hemisphere::South),
            || self.find_jet(field, Hemisphere::North),
        );
        let grid = field.grid();
        JetRecord {
            time: grid.time.clone(),
            lon: match self.config.zonal_mode {
                ZonalMode::Longitude => grid.lon.clone(),
                ZonalMode::Mean => None,
            },
            zonal_mode: self.config.zonal_mode,
            south,
            north,
        }
    }

    /// Jet series for one hemisphere.
    pub fn find_jet(&self, field: &GriddedField, hemisphere: Hemisphere) -> HemisphereSeries {
        let grid = field.grid();
        let n_time = grid.time.len();
        let n_lon = grid.n_lon();
        let n_col = match self.config.zonal_mode {
            ZonalMode::Longitude => n_lon,
            ZonalMode::Mean => 1,
        };

        let idx = grid.hemisphere_indices(hemisphere);
        if idx.is_empty() {
            warn!(%hemisphere, "no latitudes in hemisphere, all samples missing");
            return HemisphereSeries::missing(n_time, n_col);
        }
        info!(%hemisphere, times = n_time, lons = n_lon, lats = idx.len(), "tracking jet");

        let pass = self.prepare(field, hemisphere, &idx);
        let progress = AtomicUsize::new(0);
        let cells: Vec<Vec<CellOutcome>> = (0..n_time)
            .into_par_iter()
            .map(|t| {
                let row = (0..n_lon).map(|c| self.cell(&pass, t, c)).collect();
                let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_EVERY == 0 {
                    debug!(%hemisphere, done, total = n_time, "time steps processed");
                }
                row
            })
            .collect();

        let mut stats = CellStats::default();
        for outcome in cells.iter().flatten() {
            stats += outcome.stats;
        }
        if stats.rank_deficient > 0 {
            warn!(
                %hemisphere,
                cells = stats.rank_deficient,
                "rank-deficient profile fits (too few valid latitudes for fit_deg)"
            );
        }

        let mut series = match self.config.zonal_mode {
            ZonalMode::Longitude => per_longitude(&pass, &cells),
            ZonalMode::Mean => zonal_median(&pass, &cells),
        };
        series.stats = stats;
        info!(
            %hemisphere,
            found = stats.cells - stats.missing,
            missing = stats.missing,
            "jet search finished"
        );
        series
    }

    fn prepare(&self, field: &GriddedField, hemisphere: Hemisphere, idx: &[usize]) -> Pass {
        let grid = field.grid();
        let lat: Vec<f64> = idx.iter().map(|&j| grid.lat[j]).collect();
        let pv = field.pv().select(Axis(2), idx);
        let uwnd = field.uwnd().select(Axis(2), idx);
        let theta = field.theta().map(|th| th.select(Axis(2), idx));

        let threshold = hemisphere.signed_threshold(self.config.pv_value);
        let surface = VerticalInterpolator::new(threshold).locate(pv.view());
        let theta_trop = match &theta {
            Some(th) => surface.sample(Source::Field(th.view())),
            None => surface.sample(Source::Levels(&grid.level)),
        };
        let u_trop = surface.sample(Source::Field(uwnd.view()));
        let shear = &u_trop - &uwnd.index_axis(Axis(1), 0);

        Pass {
            hemisphere,
            window: fit_window(&lat, self.config.min_lat),
            lat,
            time: grid.time.values.clone(),
            theta_trop,
            u_trop,
            shear,
        }
    }

    fn cell(&self, pass: &Pass, t: usize, c: usize) -> CellOutcome {
        let profile = pass.theta_trop.slice(s![t, .., c]).to_vec();
        let shear = pass.shear.slice(s![t, .., c]).to_vec();
        let no_surface = profile.iter().all(|v| !v.is_finite());

        let fit = if no_surface {
            Err(FitFailure::NoValidPoints)
        } else {
            self.fitter
                .fit_and_differentiate(&pass.lat, &profile, pass.window.clone())
        };
        let candidates = match &fit {
            Ok(f) => jet_candidates(&f.derivative, f.window.start, pass.hemisphere),
            Err(_) => Vec::new(),
        };
        let choice = select_jet(&candidates, &shear);

        let mut stats = CellStats {
            cells: 1,
            missing: usize::from(choice.is_none()),
            ..CellStats::default()
        };
        match &fit {
            _ if no_surface => stats.no_surface = 1,
            Err(_) => stats.fit_failed = 1,
            Ok(f) => {
                stats.rank_deficient = usize::from(f.warning.is_some());
                stats.no_candidates = usize::from(candidates.is_empty());
                stats.tie_breaks = usize::from(candidates.len() > 1);
            }
        }

        if let Some(sink) = self.sink {
            if sink.wants(pass.hemisphere, t, c) {
                sink.record(&CellDiagnostic {
                    hemisphere: pass.hemisphere,
                    time_index: t,
                    time_value: pass.time[t],
                    column: c,
                    lat: &pass.lat,
                    profile: &profile,
                    shear: &shear,
                    fit: fit.as_ref().map_err(|e| *e),
                    candidates: &candidates,
                    choice,
                });
            }
        }

        CellOutcome {
            jet: choice.map(|ch| ch.index),
            stats,
        }
    }
}

fn per_longitude(pass: &Pass, cells: &[Vec<CellOutcome>]) -> HemisphereSeries {
    let n_col = cells.first().map_or(0, Vec::len);
    let mut series = HemisphereSeries::missing(cells.len(), n_col);
    for (t, row) in cells.iter().enumerate() {
        for (c, outcome) in row.iter().enumerate() {
            if let Some(j) = outcome.jet {
                series.lat[[t, c]] = pass.lat[j];
                series.theta[[t, c]] = pass.theta_trop[[t, j, c]];
                series.intensity[[t, c]] = pass.u_trop[[t, j, c]];
            }
        }
    }
    series
}

/// Median over the longitudes where a jet was found.
///
/// Theta and intensity come from the zonal-median tropopause profile, read at
/// each longitude's jet latitude and then reduced the same way.
fn zonal_median(pass: &Pass, cells: &[Vec<CellOutcome>]) -> HemisphereSeries {
    let mut series = HemisphereSeries::missing(cells.len(), 1);
    let zonal = |field: &Array3<f64>, t: usize, j: usize| {
        let row: ArrayView1<'_, f64> = field.slice(s![t, j, ..]);
        nan_median(row.iter().copied()).unwrap_or(f64::NAN)
    };
    for (t, row) in cells.iter().enumerate() {
        let jets: Vec<usize> = row.iter().filter_map(|o| o.jet).collect();
        if jets.is_empty() {
            continue;
        }
        let nan = f64::NAN;
        series.lat[[t, 0]] = nan_median(jets.iter().map(|&j| pass.lat[j])).unwrap_or(nan);
        series.theta[[t, 0]] =
            nan_median(jets.iter().map(|&j| zonal(&pass.theta_trop, t, j))).unwrap_or(nan);
        series.intensity[[t, 0]] =
            nan_median(jets.iter().map(|&j| zonal(&pass.u_trop, t, j))).unwrap_or(nan);
    }
    series
}
