//! Basis fit of theta-on-tropopause against latitude.
//!
//! Given:
//! - a latitude vector `φ_i` for one hemisphere
//! - theta on the tropopause `θ_i` at those latitudes (NaN = missing)
//! - a window `[start, end)` of indices poleward of `min_lat`
//!
//! we solve:
//! - a least squares fit `θ(x) = Σ c_k B_k(x)` over the finite samples in the
//!   window, with `x` the window latitude mapped onto `[-1, 1]`
//! - the analytic derivative `dθ/dφ = dθ/dx · 2 / (φ_max - φ_min)`
//!
//! and return the derivative at every latitude of the window, masked samples
//! included.

use std::ops::Range;

use nalgebra::{DMatrix, DVector};

use crate::domain::Basis;
use crate::math::{BasisKit, solve_least_squares};

/// Non-fatal fit quality flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitWarning {
    /// Fewer valid points than coefficients, or a numerically singular design.
    /// The coefficients are the minimum-norm solution.
    RankDeficient { valid: usize, rank: usize, terms: usize },
}

/// Why a profile could not be fitted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FitFailure {
    #[error("no finite samples in the fit window")]
    NoValidPoints,
    #[error("least squares produced no finite coefficients")]
    SolverFailed,
}

/// Fitted series plus its derivative on the window.
#[derive(Debug, Clone)]
pub struct ProfileFit {
    pub basis: Basis,
    /// Series coefficients in the mapped coordinate `x ∈ [-1, 1]`.
    pub coef: Vec<f64>,
    /// Index window of the hemisphere latitude axis.
    pub window: Range<usize>,
    /// Latitude bounds mapped to `-1` and `+1`.
    pub lat_bounds: (f64, f64),
    pub n_valid: usize,
    pub rank: usize,
    pub warning: Option<FitWarning>,
    /// `dθ/dφ` (K per degree) at each latitude of `window`.
    pub derivative: Vec<f64>,
}

impl ProfileFit {
    /// Fitted theta at latitude `lat`.
    pub fn value_at(&self, lat: f64) -> f64 {
        let kit = BasisKit::new(self.basis);
        (kit.eval)(to_unit(lat, self.lat_bounds), &self.coef)
    }
}

/// Fits one profile at a time with a fixed degree and basis.
#[derive(Debug, Clone, Copy)]
pub struct ProfileFitter {
    deg: usize,
    kit: BasisKit,
}

impl ProfileFitter {
    pub fn new(deg: usize, basis: Basis) -> Self {
        Self {
            deg,
            kit: BasisKit::new(basis),
        }
    }

    /// Fit `profile` over `window` and differentiate.
    pub fn fit_and_differentiate(
        &self,
        lat: &[f64],
        profile: &[f64],
        window: Range<usize>,
    ) -> Result<ProfileFit, FitFailure> {
        let end = window.end.min(lat.len()).min(profile.len());
        let window = window.start.min(end)..end;
        if window.is_empty() {
            return Err(FitFailure::NoValidPoints);
        }

        let lat_w = &lat[window.clone()];
        let bounds = lat_w
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let valid: Vec<usize> = window
            .clone()
            .filter(|&i| lat[i].is_finite() && profile[i].is_finite())
            .collect();
        if valid.is_empty() {
            return Err(FitFailure::NoValidPoints);
        }

        let terms = self.deg + 1;
        let mut x = DMatrix::<f64>::zeros(valid.len(), terms);
        let mut row = vec![0.0; terms];
        for (r, &i) in valid.iter().enumerate() {
            (self.kit.vander)(to_unit(lat[i], bounds), &mut row);
            for (c, v) in row.iter().enumerate() {
                x[(r, c)] = *v;
            }
        }
        let y = DVector::from_iterator(valid.len(), valid.iter().map(|&i| profile[i]));

        let sol = solve_least_squares(&x, &y).ok_or(FitFailure::SolverFailed)?;
        let coef: Vec<f64> = sol.coef.iter().copied().collect();

        let warning = (sol.rank < terms).then_some(FitWarning::RankDeficient {
            valid: valid.len(),
            rank: sol.rank,
            terms,
        });

        let der = (self.kit.derivative)(&coef);
        let dx_dlat = dx_dlat(bounds);
        let derivative = lat_w
            .iter()
            .map(|&v| (self.kit.eval)(to_unit(v, bounds), &der) * dx_dlat)
            .collect();

        Ok(ProfileFit {
            basis: self.kit.basis,
            coef,
            window,
            lat_bounds: bounds,
            n_valid: valid.len(),
            rank: sol.rank,
            warning,
            derivative,
        })
    }
}

/// Distances to `min_lat` closer than this count as equal.
const TIE_EPS: f64 = 1e-9;

/// Index window poleward of `min_lat` on one hemisphere's latitude axis.
///
/// `k = argmin | |φ| - min_lat |`, ties going to the smaller `|φ|` so both
/// storage orders pick the same magnitude. Equator-to-pole storage keeps
/// `[k, n)`, pole-to-equator storage keeps `[0, k + 1)`; the `min_lat` sample
/// is part of the window either way.
pub fn fit_window(lat: &[f64], min_lat: f64) -> Range<usize> {
    let n = lat.len();
    if n == 0 {
        return 0..0;
    }
    let mut k = 0;
    let mut best = f64::INFINITY;
    for (i, v) in lat.iter().enumerate() {
        let dist = (v.abs() - min_lat).abs();
        let tie = (dist - best).abs() <= TIE_EPS && v.abs() < lat[k].abs();
        if dist < best - TIE_EPS || tie {
            best = dist;
            k = i;
        }
    }
    if lat[0].abs() > lat[n - 1].abs() {
        0..k + 1
    } else {
        k..n
    }
}

fn to_unit(lat: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        (2.0 * lat - (lo + hi)) / (hi - lo)
    } else {
        0.0
    }
}

fn dx_dlat((lo, hi): (f64, f64)) -> f64 {
    if hi > lo { 2.0 / (hi - lo) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lat_grid(start: f64, stop: f64, step: f64) -> Vec<f64> {
        let n = ((stop - start) / step).round() as usize + 1;
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn window_includes_min_lat_in_both_orientations() {
        let north = lat_grid(0.0, 90.0, 2.5);
        let w = fit_window(&north, 10.0);
        assert_eq!(north[w.start], 10.0);
        assert_eq!(w.end, north.len());

        let south = lat_grid(-90.0, -2.5, 2.5);
        let w = fit_window(&south, 10.0);
        assert_eq!(w.start, 0);
        assert_eq!(south[w.end - 1], -10.0);
    }

    #[test]
    fn equidistant_samples_resolve_to_the_same_magnitude() {
        // 8.75 and 11.25 are both 1.25 from min_lat; both orders keep 8.75.
        let north = lat_grid(1.25, 88.75, 2.5);
        let w = fit_window(&north, 10.0);
        assert_eq!(north[w.start], 8.75);

        let south = lat_grid(-88.75, -1.25, 2.5);
        let w = fit_window(&south, 10.0);
        assert_eq!(south[w.end - 1], -8.75);
        assert_eq!(w.len(), north.len() - fit_window(&north, 10.0).start);
    }

    #[test]
    fn window_of_empty_axis_is_empty() {
        assert!(fit_window(&[], 10.0).is_empty());
    }

    #[test]
    fn recovers_polynomial_derivative() {
        let lat = lat_grid(0.0, 60.0, 2.5);
        let theta: Vec<f64> = lat
            .iter()
            .map(|p| 380.0 - 1.5 * p + 1e-4 * (p - 20.0_f64).powi(3))
            .collect();
        let window = fit_window(&lat, 10.0);
        for basis in [Basis::Chebyshev, Basis::Legendre, Basis::Power] {
            let fit = ProfileFitter::new(6, basis)
                .fit_and_differentiate(&lat, &theta, window.clone())
                .unwrap();
            assert!(fit.warning.is_none());
            for (i, d) in window.clone().zip(fit.derivative.iter()) {
                let expected = -1.5 + 3e-4 * (lat[i] - 20.0).powi(2);
                assert_abs_diff_eq!(*d, expected, epsilon = 1e-7);
            }
            assert_abs_diff_eq!(fit.value_at(30.0), theta[12], epsilon = 1e-6);
        }
    }

    #[test]
    fn missing_samples_are_masked_not_zeroed() {
        let lat = lat_grid(10.0, 60.0, 2.5);
        let mut theta: Vec<f64> = lat.iter().map(|p| 350.0 - 0.8 * p).collect();
        theta[4] = f64::NAN;
        theta[9] = f64::NAN;
        let fit = ProfileFitter::new(3, Basis::Chebyshev)
            .fit_and_differentiate(&lat, &theta, 0..lat.len())
            .unwrap();
        assert_eq!(fit.n_valid, lat.len() - 2);
        assert_eq!(fit.derivative.len(), lat.len());
        for d in &fit.derivative {
            assert_abs_diff_eq!(*d, -0.8, epsilon = 1e-9);
        }
    }

    #[test]
    fn too_few_points_is_flagged_rank_deficient() {
        let lat = lat_grid(10.0, 60.0, 2.5);
        let mut theta = vec![f64::NAN; lat.len()];
        theta[2] = 360.0;
        theta[5] = 350.0;
        theta[8] = 345.0;
        let fit = ProfileFitter::new(6, Basis::Chebyshev)
            .fit_and_differentiate(&lat, &theta, 0..lat.len())
            .unwrap();
        assert_eq!(
            fit.warning,
            Some(FitWarning::RankDeficient {
                valid: 3,
                rank: 3,
                terms: 7
            })
        );
        assert!(fit.derivative.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn all_missing_profile_fails() {
        let lat = lat_grid(10.0, 30.0, 5.0);
        let theta = vec![f64::NAN; lat.len()];
        let err = ProfileFitter::new(6, Basis::Legendre)
            .fit_and_differentiate(&lat, &theta, 0..lat.len())
            .unwrap_err();
        assert_eq!(err, FitFailure::NoValidPoints);
    }
}
