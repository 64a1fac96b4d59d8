//! Synthetic isentropic scenes.
//!
//! The scenes are built so the tropopause is known exactly:
//!
//! - PV grows linearly with theta in every column and reaches the threshold
//!   exactly at the prescribed tropopause theta `θ_t(φ)`
//! - zonal wind grows linearly from zero at the lowest level and equals the
//!   prescribed jet wind at `θ_t`
//!
//! Linear vertical interpolation therefore recovers `θ_t` and the jet wind
//! without error, which is what the end-to-end tests rely on. `sample_field`
//! adds a seasonal cycle and seeded noise on top for the `stj sample` command.

use std::f64::consts::PI;

use ndarray::Array4;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::debug;

use crate::domain::LevelKind;
use crate::error::JetError;
use crate::grid::{AxisOrder, Grid, GriddedField, TimeAxis};

/// Theta where synthetic PV would reach zero (K).
const THETA_PV_ZERO: f64 = 250.0;

/// Build a field on theta levels from a prescribed tropopause and jet wind.
///
/// Both closures take `(time index, lat, lon)`; a non-finite tropopause
/// leaves the whole column missing. PV is negative in the south.
pub fn synthetic_field<F, G>(
    grid: Grid,
    pv_value: f64,
    tropopause: F,
    jet_wind: G,
) -> Result<GriddedField, JetError>
where
    F: Fn(usize, f64, f64) -> f64,
    G: Fn(usize, f64, f64) -> f64,
{
    if grid.level_kind != LevelKind::Theta {
        return Err(JetError::InvalidCoordinate {
            axis: "level",
            reason: "synthetic scenes use theta levels".to_string(),
        });
    }
    let shape = grid.shape();
    let theta_sfc = grid.level.iter().copied().fold(f64::INFINITY, f64::min);
    let lon_at = |i: usize| grid.lon.as_ref().map_or(0.0, |lon| lon[i]);

    let mut pv = Array4::from_elem(shape, f64::NAN);
    let mut uwnd = Array4::from_elem(shape, f64::NAN);
    for t in 0..shape[0] {
        for (j, &phi) in grid.lat.iter().enumerate() {
            for i in 0..shape[3] {
                let lam = lon_at(i);
                let theta_t = tropopause(t, phi, lam);
                if !theta_t.is_finite() {
                    continue;
                }
                let u_top = jet_wind(t, phi, lam);
                let sign = if phi < 0.0 { -1.0 } else { 1.0 };
                for (k, &theta) in grid.level.iter().enumerate() {
                    pv[[t, k, j, i]] =
                        sign * pv_value.abs() * (theta - THETA_PV_ZERO) / (theta_t - THETA_PV_ZERO);
                    uwnd[[t, k, j, i]] = u_top * (theta - theta_sfc) / (theta_t - theta_sfc);
                }
            }
        }
    }
    GriddedField::new(grid, AxisOrder::CANONICAL, pv, uwnd, None)
}

/// Tropopause theta with a single break at `break_lat` (K).
///
/// `dθ/d|φ| = -1.5 + 3e-4 (|φ| - break_lat)^2`, which is steepest at the
/// break, with `θ = 380 K` at 10 degrees.
pub fn single_break_tropopause(lat: f64, break_lat: f64) -> f64 {
    let a = lat.abs();
    380.0 - 1.5 * (a - 10.0) + 1e-4 * ((a - break_lat).powi(3) - (10.0 - break_lat).powi(3))
}

/// Options for `sample_field`.
#[derive(Debug, Clone)]
pub struct SampleOptions {
    /// Monthly time steps.
    pub n_times: usize,
    pub n_lons: usize,
    pub seed: u64,
    /// Mean break latitude (degrees).
    pub break_lat: f64,
    /// Seasonal amplitude of the break latitude (degrees).
    pub seasonal_amp: f64,
    /// Standard deviation of the per-step break latitude noise (degrees).
    pub noise_sd: f64,
    pub start_year: i32,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            n_times: 24,
            n_lons: 8,
            seed: 42,
            break_lat: 27.5,
            seasonal_amp: 4.0,
            noise_sd: 1.0,
            start_year: 1979,
        }
    }
}

/// A monthly, 360-day-calendar scene on a 2.5 degree grid.
///
/// The break latitude follows a seasonal cycle (poleward in local summer)
/// plus Gaussian noise; the southern hemisphere is half a year out of phase.
pub fn sample_field(opts: &SampleOptions) -> Result<GriddedField, JetError> {
    if opts.n_times == 0 || opts.n_lons == 0 {
        return Err(JetError::InvalidConfig {
            field: "sample",
            value: format!("{} times x {} lons", opts.n_times, opts.n_lons),
            reason: "need at least one time step and one longitude",
        });
    }
    let normal = Normal::new(0.0, opts.noise_sd.max(0.0)).map_err(|_| JetError::InvalidConfig {
        field: "noise_sd",
        value: opts.noise_sd.to_string(),
        reason: "must be finite",
    })?;
    let mut rng = StdRng::seed_from_u64(opts.seed);

    // Per (time, hemisphere) break latitude, drawn up front so the closure
    // below stays a pure lookup.
    let breaks: Vec<[f64; 2]> = (0..opts.n_times)
        .map(|t| {
            let phase = 2.0 * PI * (t % 12) as f64 / 12.0;
            let north = opts.break_lat - opts.seasonal_amp * phase.cos() + normal.sample(&mut rng);
            let south = opts.break_lat + opts.seasonal_amp * phase.cos() + normal.sample(&mut rng);
            [south.clamp(12.5, 45.0), north.clamp(12.5, 45.0)]
        })
        .collect();
    debug!(steps = opts.n_times, seed = opts.seed, "drew sample break latitudes");

    let time = TimeAxis::new(
        (0..opts.n_times).map(|t| 30.0 * t as f64 + 15.0).collect(),
        format!("days since {}-01-01 00:00:00", opts.start_year),
        "360_day",
    );
    let lat: Vec<f64> = (0..=72).map(|j| -90.0 + 2.5 * j as f64).collect();
    let lon: Vec<f64> = (0..opts.n_lons)
        .map(|i| 360.0 * i as f64 / opts.n_lons as f64)
        .collect();
    let level: Vec<f64> = (0..=35).map(|k| 265.0 + 5.0 * k as f64).collect();
    let grid = Grid::new(time, level, LevelKind::Theta, lat, Some(lon))?;

    synthetic_field(
        grid,
        2.0,
        |t, phi, lam| {
            // A weak wavenumber-2 meander keeps longitudes distinct.
            let b = breaks[t][usize::from(phi >= 0.0)] + 1.5 * (2.0 * lam.to_radians()).sin();
            single_break_tropopause(phi, b)
        },
        |t, phi, _| {
            let b = breaks[t][usize::from(phi >= 0.0)];
            35.0 * (-((phi.abs() - b) / 12.0).powi(2)).exp() + 5.0
        },
    )
}
