//! Least squares solvers.
//!
//! The seasonal model is linear in its coefficients once the other component
//! is held fixed, so fitting reduces to repeatedly solving small problems of
//! the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2 + Σ_j λ_j β_j^2
//! ```
//!
//! Implementation choices:
//! - Ridge penalties are applied by appending `sqrt(λ_j) e_j` rows to the design
//!   matrix (and zeros to `y`), which keeps a single SVD code path.
//! - SVD handles tall and rank-deficient systems (short training windows with
//!   many seasonal terms) without panicking.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol)
            && beta.iter().all(|v| v.is_finite())
        {
            return Some(beta);
        }
    }

    None
}

/// Solve a ridge-penalized least squares problem.
///
/// `penalties[j]` is the ridge weight `λ_j` of column `j` (0 = unpenalized).
///
/// # Panics
/// Panics if `penalties.len() != x.ncols()` or `y.len() != x.nrows()`.
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, penalties: &[f64]) -> Option<DVector<f64>> {
    assert_eq!(penalties.len(), x.ncols(), "one penalty per column");
    assert_eq!(y.len(), x.nrows(), "one target per row");

    let penalized: Vec<(usize, f64)> = penalties
        .iter()
        .enumerate()
        .filter(|(_, l)| **l > 0.0)
        .map(|(j, l)| (j, l.sqrt()))
        .collect();
    if penalized.is_empty() {
        return solve_least_squares(x, y);
    }

    let n = x.nrows();
    let p = x.ncols();
    let mut xa = DMatrix::<f64>::zeros(n + penalized.len(), p);
    let mut ya = DVector::<f64>::zeros(n + penalized.len());
    xa.rows_mut(0, n).copy_from(x);
    ya.rows_mut(0, n).copy_from(y);
    for (k, &(j, s)) in penalized.iter().enumerate() {
        xa[(n + k, j)] = s;
    }

    solve_least_squares(&xa, &ya)
}
