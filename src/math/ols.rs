//! Least squares solver.
//!
//! Each jet cell solves one small problem of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T c)^2
//! ```
//!
//! where `x_i` is a basis design row at a valid latitude and `c` are the series
//! coefficients.
//!
//! Implementation choices:
//! - SVD, so the same code handles tall, square and wide (underdetermined)
//!   systems. Wide systems get the minimum-norm solution.
//! - Columns are scaled to unit norm before the decomposition, which is what
//!   keeps high-degree power bases usable.
//! - The numerical rank is reported so callers can flag rank-deficient fits
//!   instead of failing them.

use nalgebra::{DMatrix, DVector};

/// Relative singular value cutoff used for the rank estimate.
const RANK_RCOND: f64 = 1e-12;

/// Coefficients plus the numerical rank of the (column-scaled) design matrix.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub coef: DVector<f64>,
    pub rank: usize,
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no finite solution could be produced.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<LeastSquares> {
    if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
        return None;
    }

    let mut scaled = x.clone();
    let mut scale = vec![1.0; x.ncols()];
    for (j, mut col) in scaled.column_iter_mut().enumerate() {
        let norm = col.norm();
        if norm.is_finite() && norm > 0.0 {
            col /= norm;
            scale[j] = norm;
        }
    }

    let svd = scaled.svd(true, true);
    let s_max = svd.singular_values.max();
    if !s_max.is_finite() {
        return None;
    }
    let rank = svd
        .singular_values
        .iter()
        .filter(|&&s| s > s_max * RANK_RCOND)
        .count();

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[s_max * RANK_RCOND, 1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                let coef = DVector::from_iterator(
                    beta.len(),
                    beta.iter().zip(scale.iter()).map(|(b, s)| b / s),
                );
                return Some(LeastSquares { coef, rank });
            }
        }
    }

    None
}
