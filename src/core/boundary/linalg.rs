use ndarray::{Array1, Array2};

/// Pivots at or below this fraction of the largest diagonal entry are
/// treated as zero.
const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-12;

/// Solves `a · x = b` for symmetric positive-definite `a` via Cholesky.
///
/// Returns `None` when `a` is not numerically positive definite, which is how
/// singular covariance matrices show up.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let max_diag = a.diag().iter().cloned().fold(0.0_f64, f64::max);
    if !(max_diag > 0.0) || !max_diag.is_finite() {
        return None;
    }
    let tolerance = max_diag * RELATIVE_PIVOT_TOLERANCE;

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut pivot = a[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !(pivot > tolerance) {
            return None;
        }
        let pivot = pivot.sqrt();
        l[[j, j]] = pivot;

        for i in (j + 1)..n {
            let mut value = a[[i, j]];
            for k in 0..j {
                value -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = value / pivot;
        }
    }

    // L · y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut value = b[i];
        for k in 0..i {
            value -= l[[i, k]] * y[k];
        }
        y[i] = value / l[[i, i]];
    }

    // Lᵀ · x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut value = y[i];
        for k in (i + 1)..n {
            value -= l[[k, i]] * x[k];
        }
        x[i] = value / l[[i, i]];
    }

    Some(x)
}
