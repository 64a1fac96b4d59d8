//! Gridded input fields.
//!
//! A `GriddedField` bundles the coordinates with the 4-D arrays the jet search
//! reads:
//!
//! - zonal wind `uwnd` (m s-1)
//! - potential vorticity `pv` (PVU)
//! - potential temperature `theta` (K), only for pressure-level data
//!
//! Construction does all the normalization once:
//!
//! - arrays are permuted from their tagged axis order into `(time, level, lat, lon)`
//! - the level axis is flipped if needed so index 0 is nearest the surface
//! - PV given in SI units (|PV| < 1) is rescaled to PVU
//!
//! After that the field is read-only.

use std::ops::Range;

use ndarray::{Array4, ArrayView4, Axis, s};
use tracing::{debug, info};

use crate::domain::{Hemisphere, LevelKind};
use crate::error::JetError;
use crate::grid::{AxisOrder, TimeAxis};

/// `R / cp` for dry air.
pub const KAPPA: f64 = 0.286;

/// Reference pressure for potential temperature (hPa).
pub const P_REF: f64 = 1000.0;

/// PV magnitudes below this are taken to be in SI units (K m2 kg-1 s-1).
const PV_SI_LIMIT: f64 = 1.0;

/// Coordinate vectors of a 4-D field.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub time: TimeAxis,
    pub level: Vec<f64>,
    pub level_kind: LevelKind,
    pub lat: Vec<f64>,
    /// `None` for zonally averaged input (one pseudo-longitude column).
    pub lon: Option<Vec<f64>>,
}

impl Grid {
    pub fn new(
        time: TimeAxis,
        level: Vec<f64>,
        level_kind: LevelKind,
        lat: Vec<f64>,
        lon: Option<Vec<f64>>,
    ) -> Result<Self, JetError> {
        time.validate()?;
        check_monotonic("level", &level)?;
        check_monotonic("lat", &lat)?;
        if let Some(lon) = &lon {
            if lon.is_empty() || lon.iter().any(|v| !v.is_finite()) {
                return Err(JetError::InvalidCoordinate {
                    axis: "lon",
                    reason: "must be non-empty and finite".to_string(),
                });
            }
        }
        Ok(Self {
            time,
            level,
            level_kind,
            lat,
            lon,
        })
    }

    pub fn n_lon(&self) -> usize {
        self.lon.as_ref().map_or(1, Vec::len)
    }

    /// Expected shape of every field, canonical order.
    pub fn shape(&self) -> [usize; 4] {
        [self.time.len(), self.level.len(), self.lat.len(), self.n_lon()]
    }

    /// Latitude indices (storage order) that belong to `hemisphere`.
    pub fn hemisphere_indices(&self, hemisphere: Hemisphere) -> Vec<usize> {
        self.lat
            .iter()
            .enumerate()
            .filter(|(_, lat)| hemisphere.contains(**lat))
            .map(|(i, _)| i)
            .collect()
    }
}

fn check_monotonic(axis: &'static str, values: &[f64]) -> Result<(), JetError> {
    if values.is_empty() {
        return Err(JetError::InvalidCoordinate {
            axis,
            reason: "empty".to_string(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(JetError::InvalidCoordinate {
            axis,
            reason: "non-finite value".to_string(),
        });
    }
    let increasing = values.windows(2).all(|w| w[1] > w[0]);
    let decreasing = values.windows(2).all(|w| w[1] < w[0]);
    if increasing || decreasing {
        Ok(())
    } else {
        Err(JetError::InvalidCoordinate {
            axis,
            reason: "must be strictly monotonic".to_string(),
        })
    }
}

/// Wind, PV and (optionally) theta on a common grid, canonical axis order.
#[derive(Debug, Clone)]
pub struct GriddedField {
    grid: Grid,
    pv: Array4<f64>,
    uwnd: Array4<f64>,
    theta: Option<Array4<f64>>,
}

impl GriddedField {
    /// Build a field from arrays laid out in `order`.
    ///
    /// `theta` is required for pressure levels and ignored (dropped) for theta
    /// levels, where the level coordinate already is potential temperature.
    pub fn new(
        mut grid: Grid,
        order: AxisOrder,
        pv: Array4<f64>,
        uwnd: Array4<f64>,
        theta: Option<Array4<f64>>,
    ) -> Result<Self, JetError> {
        let expected = grid.shape();
        let perm = order.to_canonical();
        let mut pv = canonical("pv", pv, perm, expected)?;
        let mut uwnd = canonical("uwnd", uwnd, perm, expected)?;
        let mut theta = match (grid.level_kind, theta) {
            (LevelKind::Pressure, None) => return Err(JetError::MissingTheta),
            (LevelKind::Pressure, Some(th)) => Some(canonical("theta", th, perm, expected)?),
            (LevelKind::Theta, _) => None,
        };

        let n_lev = grid.level.len();
        if n_lev > 1 && !grid.level_kind.is_upward(grid.level[0], grid.level[n_lev - 1]) {
            debug!(kind = ?grid.level_kind, "reversing level axis to surface-first order");
            grid.level.reverse();
            pv.invert_axis(Axis(1));
            uwnd.invert_axis(Axis(1));
            if let Some(th) = theta.as_mut() {
                th.invert_axis(Axis(1));
            }
        }

        let pv_max = pv
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if pv_max > 0.0 && pv_max < PV_SI_LIMIT {
            info!(pv_max, "PV looks like SI units, scaling to PVU");
            pv.mapv_inplace(|v| v * 1e6);
        }

        Ok(Self {
            grid,
            pv: pv.as_standard_layout().into_owned(),
            uwnd: uwnd.as_standard_layout().into_owned(),
            theta: theta.map(|th| th.as_standard_layout().into_owned()),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pv(&self) -> ArrayView4<'_, f64> {
        self.pv.view()
    }

    pub fn uwnd(&self) -> ArrayView4<'_, f64> {
        self.uwnd.view()
    }

    /// Co-located potential temperature, `None` when levels are isentropic.
    pub fn theta(&self) -> Option<ArrayView4<'_, f64>> {
        self.theta.as_ref().map(|th| th.view())
    }

    /// Copy of the time steps in `range`.
    pub fn slice_time(&self, range: Range<usize>) -> GriddedField {
        let (a, b) = (range.start, range.end);
        GriddedField {
            grid: Grid {
                time: self.grid.time.slice(range),
                ..self.grid.clone()
            },
            pv: self.pv.slice(s![a..b, .., .., ..]).to_owned(),
            uwnd: self.uwnd.slice(s![a..b, .., .., ..]).to_owned(),
            theta: self
                .theta
                .as_ref()
                .map(|th| th.slice(s![a..b, .., .., ..]).to_owned()),
        }
    }
}

fn canonical(
    name: &'static str,
    array: Array4<f64>,
    perm: [usize; 4],
    expected: [usize; 4],
) -> Result<Array4<f64>, JetError> {
    let array = array.permuted_axes(perm);
    if array.shape() != expected.as_slice() {
        return Err(JetError::ShapeMismatch {
            field: name,
            actual: array.shape().to_vec(),
            expected: expected.to_vec(),
        });
    }
    Ok(array)
}

/// Potential temperature from air temperature on pressure levels.
///
/// `air_temp` is canonical `(time, level, lat, lon)`; `pressure` (hPa) is the
/// level coordinate in the same order.
pub fn potential_temperature(air_temp: ArrayView4<'_, f64>, pressure: &[f64]) -> Array4<f64> {
    let mut theta = air_temp.to_owned();
    for (mut level, &p) in theta.axis_iter_mut(Axis(1)).zip(pressure.iter()) {
        let factor = (P_REF / p).powf(KAPPA);
        level.mapv_inplace(|t| t * factor);
    }
    theta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Dim;
    use approx::assert_abs_diff_eq;

    fn time(n: usize) -> TimeAxis {
        TimeAxis::new((0..n).map(|i| i as f64).collect(), "days since 2000-01-01", "standard")
    }

    fn grid(level: Vec<f64>, kind: LevelKind) -> Grid {
        Grid::new(time(2), level, kind, vec![-30.0, 0.0, 30.0], Some(vec![0.0, 90.0])).unwrap()
    }

    #[test]
    fn grid_rejects_non_monotonic_latitude() {
        let err = Grid::new(time(1), vec![300.0], LevelKind::Theta, vec![0.0, 10.0, 5.0], None)
            .unwrap_err();
        assert!(matches!(err, JetError::InvalidCoordinate { axis: "lat", .. }));
    }

    #[test]
    fn missing_lon_means_one_column() {
        let g = Grid::new(time(3), vec![300.0, 310.0], LevelKind::Theta, vec![10.0, 20.0], None)
            .unwrap();
        assert_eq!(g.shape(), [3, 2, 2, 1]);
    }

    #[test]
    fn hemisphere_indices_follow_storage_order() {
        let g = grid(vec![300.0, 310.0], LevelKind::Theta);
        assert_eq!(g.hemisphere_indices(Hemisphere::South), vec![0]);
        assert_eq!(g.hemisphere_indices(Hemisphere::North), vec![1, 2]);
    }

    #[test]
    fn permutes_tagged_arrays_to_canonical() {
        let g = grid(vec![300.0, 310.0], LevelKind::Theta);
        // stored as (lat, lon, level, time)
        let raw = Array4::from_shape_fn((3, 2, 2, 2), |(la, lo, lv, t)| {
            (1000 * t + 100 * lv + 10 * la + lo) as f64
        });
        let order = AxisOrder::new([Dim::Lat, Dim::Lon, Dim::Level, Dim::Time]).unwrap();
        let f = GriddedField::new(g, order, raw.clone() * 1e-3, raw, None).unwrap();
        assert_eq!(f.uwnd()[[1, 0, 2, 1]], 1021.0);
        assert_eq!(f.uwnd().shape(), &[2, 2, 3, 2]);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let g = grid(vec![300.0, 310.0], LevelKind::Theta);
        let bad = Array4::<f64>::zeros((2, 2, 4, 2));
        let err = GriddedField::new(g, AxisOrder::CANONICAL, bad.clone(), bad, None).unwrap_err();
        assert!(matches!(err, JetError::ShapeMismatch { field: "pv", .. }));
    }

    #[test]
    fn pressure_levels_are_flipped_surface_first() {
        let g = grid(vec![200.0, 500.0, 850.0], LevelKind::Pressure);
        let lev = Array4::from_shape_fn((2, 3, 3, 2), |(_, k, _, _)| k as f64 + 2.0);
        let f = GriddedField::new(g, AxisOrder::CANONICAL, lev.clone(), lev.clone(), Some(lev))
            .unwrap();
        assert_eq!(f.grid().level, vec![850.0, 500.0, 200.0]);
        assert_eq!(f.uwnd()[[0, 0, 0, 0]], 4.0);
        assert_eq!(f.theta().unwrap()[[1, 2, 1, 1]], 2.0);
    }

    #[test]
    fn pressure_levels_need_theta() {
        let g = grid(vec![850.0, 500.0], LevelKind::Pressure);
        let a = Array4::<f64>::zeros((2, 2, 3, 2));
        let err = GriddedField::new(g, AxisOrder::CANONICAL, a.clone(), a, None).unwrap_err();
        assert_eq!(err, JetError::MissingTheta);
    }

    #[test]
    fn si_pv_is_scaled_to_pvu() {
        let g = grid(vec![300.0, 310.0], LevelKind::Theta);
        let pv = Array4::from_elem((2, 2, 3, 2), 2.0e-6);
        let u = Array4::<f64>::zeros((2, 2, 3, 2));
        let f = GriddedField::new(g, AxisOrder::CANONICAL, pv, u, None).unwrap();
        assert_abs_diff_eq!(f.pv()[[0, 1, 2, 1]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn slice_time_keeps_requested_steps() {
        let g = grid(vec![300.0, 310.0], LevelKind::Theta);
        let u = Array4::from_shape_fn((2, 2, 3, 2), |(t, _, _, _)| t as f64);
        let f = GriddedField::new(g, AxisOrder::CANONICAL, u.clone() + 5.0, u, None).unwrap();
        let one = f.slice_time(1..2);
        assert_eq!(one.grid().time.values, vec![1.0]);
        assert!(one.uwnd().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn theta_from_temperature() {
        let t = Array4::from_elem((1, 2, 1, 1), 250.0);
        let th = potential_temperature(t.view(), &[1000.0, 250.0]);
        assert_abs_diff_eq!(th[[0, 0, 0, 0]], 250.0, epsilon = 1e-12);
        assert_abs_diff_eq!(th[[0, 1, 0, 0]], 250.0 * 4.0_f64.powf(0.286), epsilon = 1e-9);
    }
}
