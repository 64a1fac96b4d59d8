//! Orthogonal and power polynomial bases.
//!
//! Each basis is a fixed triple of plain functions:
//!
//! - `vander(x, out)` fills one design row `[B_0(x), ..., B_deg(x)]`
//! - `derivative(c)` maps series coefficients to the coefficients of `d/dx`
//! - `eval(x, c)` evaluates a series
//!
//! `BasisKit::new` picks the triple once, so the per-cell code never branches
//! on the basis family.
//!
//! Numerical notes:
//! - Chebyshev and Legendre series are evaluated with Clenshaw-style
//!   recurrences; power series with Horner's rule.
//! - The series are meant to be used on `x ∈ [-1, 1]`. Callers map their
//!   abscissa onto that interval.

use crate::domain::Basis;

/// The (design row, derivative, evaluate) functions of one basis family.
#[derive(Debug, Clone, Copy)]
pub struct BasisKit {
    pub basis: Basis,
    pub vander: fn(f64, &mut [f64]),
    pub derivative: fn(&[f64]) -> Vec<f64>,
    pub eval: fn(f64, &[f64]) -> f64,
}

impl BasisKit {
    pub fn new(basis: Basis) -> Self {
        match basis {
            Basis::Chebyshev => Self {
                basis,
                vander: chebyshev_vander,
                derivative: chebyshev_derivative,
                eval: chebyshev_eval,
            },
            Basis::Legendre => Self {
                basis,
                vander: legendre_vander,
                derivative: legendre_derivative,
                eval: legendre_eval,
            },
            Basis::Power => Self {
                basis,
                vander: power_vander,
                derivative: power_derivative,
                eval: power_eval,
            },
        }
    }
}

/// `T_0 = 1`, `T_1 = x`, `T_{k+1} = 2x T_k - T_{k-1}`.
pub fn chebyshev_vander(x: f64, out: &mut [f64]) {
    if out.is_empty() {
        return;
    }
    out[0] = 1.0;
    if out.len() > 1 {
        out[1] = x;
    }
    for k in 2..out.len() {
        out[k] = 2.0 * x * out[k - 1] - out[k - 2];
    }
}

/// `(k+1) P_{k+1} = (2k+1) x P_k - k P_{k-1}`.
pub fn legendre_vander(x: f64, out: &mut [f64]) {
    if out.is_empty() {
        return;
    }
    out[0] = 1.0;
    if out.len() > 1 {
        out[1] = x;
    }
    for k in 2..out.len() {
        let kf = k as f64;
        out[k] = ((2.0 * kf - 1.0) * x * out[k - 1] - (kf - 1.0) * out[k - 2]) / kf;
    }
}

pub fn power_vander(x: f64, out: &mut [f64]) {
    if out.is_empty() {
        return;
    }
    out[0] = 1.0;
    for k in 1..out.len() {
        out[k] = x * out[k - 1];
    }
}

/// Derivative of a Chebyshev series.
///
/// A constant (or empty) series differentiates to `[0.0]`.
pub fn chebyshev_derivative(coef: &[f64]) -> Vec<f64> {
    let n = coef.len();
    if n <= 1 {
        return vec![0.0];
    }
    let mut c = coef.to_vec();
    let deg = n - 1;
    let mut der = vec![0.0; deg];
    for j in (3..=deg).rev() {
        der[j - 1] = (2 * j) as f64 * c[j];
        c[j - 2] += j as f64 * c[j] / (j - 2) as f64;
    }
    if deg > 1 {
        der[1] = 4.0 * c[2];
    }
    der[0] = c[1];
    der
}

/// Derivative of a Legendre series.
pub fn legendre_derivative(coef: &[f64]) -> Vec<f64> {
    let n = coef.len();
    if n <= 1 {
        return vec![0.0];
    }
    let mut c = coef.to_vec();
    let deg = n - 1;
    let mut der = vec![0.0; deg];
    for j in (3..=deg).rev() {
        der[j - 1] = (2 * j - 1) as f64 * c[j];
        c[j - 2] += c[j];
    }
    if deg > 1 {
        der[1] = 3.0 * c[2];
    }
    der[0] = c[1];
    der
}

pub fn power_derivative(coef: &[f64]) -> Vec<f64> {
    if coef.len() <= 1 {
        return vec![0.0];
    }
    coef.iter()
        .enumerate()
        .skip(1)
        .map(|(j, &c)| j as f64 * c)
        .collect()
}

pub fn chebyshev_eval(x: f64, coef: &[f64]) -> f64 {
    let n = coef.len();
    match n {
        0 => 0.0,
        1 => coef[0],
        2 => coef[0] + coef[1] * x,
        _ => {
            let x2 = 2.0 * x;
            let mut c0 = coef[n - 2];
            let mut c1 = coef[n - 1];
            for i in 3..=n {
                let tmp = c0;
                c0 = coef[n - i] - c1;
                c1 = tmp + c1 * x2;
            }
            c0 + c1 * x
        }
    }
}

pub fn legendre_eval(x: f64, coef: &[f64]) -> f64 {
    let n = coef.len();
    match n {
        0 => 0.0,
        1 => coef[0],
        2 => coef[0] + coef[1] * x,
        _ => {
            let mut nd = n as f64;
            let mut c0 = coef[n - 2];
            let mut c1 = coef[n - 1];
            for i in 3..=n {
                let tmp = c0;
                nd -= 1.0;
                c0 = coef[n - i] - (c1 * (nd - 1.0)) / nd;
                c1 = tmp + (c1 * x * (2.0 * nd - 1.0)) / nd;
            }
            c0 + c1 * x
        }
    }
}

pub fn power_eval(x: f64, coef: &[f64]) -> f64 {
    coef.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [Basis; 3] = [Basis::Chebyshev, Basis::Legendre, Basis::Power];

    #[test]
    fn chebyshev_derivative_of_t3() {
        // T3 = 4x^3 - 3x, T3' = 12x^2 - 3 = 6 T2 + 3 T0
        let der = chebyshev_derivative(&[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(der, vec![3.0, 0.0, 6.0]);
    }

    #[test]
    fn legendre_derivative_of_p3() {
        // P3' = 5 P2 + P0
        let der = legendre_derivative(&[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(der, vec![1.0, 0.0, 5.0]);
    }

    #[test]
    fn constant_series_has_zero_derivative() {
        for basis in ALL {
            let kit = BasisKit::new(basis);
            let der = (kit.derivative)(&[3.5]);
            assert_eq!((kit.eval)(0.3, &der), 0.0);
        }
    }

    #[test]
    fn eval_matches_design_row() {
        let coef = [0.4, -1.2, 0.7, 2.0, -0.3, 0.05];
        for basis in ALL {
            let kit = BasisKit::new(basis);
            let mut row = vec![0.0; coef.len()];
            for &x in &[-1.0, -0.6, 0.0, 0.25, 0.9] {
                (kit.vander)(x, &mut row);
                let dot: f64 = row.iter().zip(coef.iter()).map(|(b, c)| b * c).sum();
                assert_abs_diff_eq!((kit.eval)(x, &coef), dot, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn derivative_matches_central_difference() {
        let coef = [1.0, 0.5, -0.25, 0.8, 0.1, -0.6, 0.3];
        let h = 1e-6;
        for basis in ALL {
            let kit = BasisKit::new(basis);
            let der = (kit.derivative)(&coef);
            for &x in &[-0.9, -0.3, 0.2, 0.75] {
                let fd = ((kit.eval)(x + h, &coef) - (kit.eval)(x - h, &coef)) / (2.0 * h);
                assert_abs_diff_eq!((kit.eval)(x, &der), fd, epsilon = 1e-6);
            }
        }
    }
}
