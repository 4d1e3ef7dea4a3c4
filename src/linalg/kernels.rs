//! Dense, allocation-free linear-algebra kernels over [`MatrixView`]/
//! [`MatrixViewMut`]. Column-major throughout. The naive triple-loop
//! order is used everywhere; no tiling or blocking.

use crate::error::LinAlgError;
use crate::linalg::view::{MatrixView, MatrixViewMut};

#[inline]
fn get_op(m: MatrixView<'_>, i: usize, k: usize, transposed: bool) -> f64 {
    if transposed { m.get(k, i) } else { m.get(i, k) }
}

/// `C := beta*C + alpha*op(A)*op(B)`, where `op` transposes its operand iff
/// the corresponding flag is set. `beta = 0` still zeroes `C` first.
pub fn multiply(
    a: MatrixView<'_>,
    b: MatrixView<'_>,
    mut c: MatrixViewMut<'_>,
    t_a: bool,
    t_b: bool,
    alpha: f64,
    beta: f64,
) -> Result<(), LinAlgError> {
    let (n, m) = if t_a { (a.cols(), a.rows()) } else { (a.rows(), a.cols()) };
    let p = if t_b { b.rows() } else { b.cols() };
    let b_inner = if t_b { b.cols() } else { b.rows() };

    if b_inner != m || c.rows() != n || c.cols() != p {
        return Err(LinAlgError::ShapeMismatch);
    }

    for j in 0..p {
        for i in 0..n {
            let mut acc = 0.0;
            for k in 0..m {
                acc += get_op(a, i, k, t_a) * get_op(b, k, j, t_b);
            }
            let cij = c.get(i, j) * beta + alpha * acc;
            c.set(i, j, cij);
        }
    }
    Ok(())
}

/// Same as [`multiply`] with `t_a = t_b = false`, but `a_sym` is read as
/// lower-triangular storage of a symmetric matrix: element `(i, k)` is
/// fetched from `(max(i,k), min(i,k))`, so the upper triangle is never
/// read.
pub fn symmetric_multiply(
    a_sym: MatrixView<'_>,
    b: MatrixView<'_>,
    mut c: MatrixViewMut<'_>,
    alpha: f64,
    beta: f64,
) -> Result<(), LinAlgError> {
    let n = a_sym.rows();
    let m = a_sym.cols();
    let p = b.cols();

    if b.rows() != m || c.rows() != n || c.cols() != p {
        return Err(LinAlgError::ShapeMismatch);
    }

    for j in 0..p {
        for i in 0..n {
            let mut acc = 0.0;
            for k in 0..m {
                let (r, col) = if i > k { (i, k) } else { (k, i) };
                acc += a_sym.get(r, col) * b.get(k, j);
            }
            let cij = c.get(i, j) * beta + alpha * acc;
            c.set(i, j, cij);
        }
    }
    Ok(())
}

/// `b := b + alpha*a`.
pub fn add(a: MatrixView<'_>, mut b: MatrixViewMut<'_>, alpha: f64) -> Result<(), LinAlgError> {
    if a.shape() != b.shape() {
        return Err(LinAlgError::ShapeMismatch);
    }
    for (dst, src) in b.data_mut().iter_mut().zip(a.data().iter()) {
        *dst += alpha * src;
    }
    Ok(())
}

/// `a := alpha*a`, in place.
pub fn scale(mut a: MatrixViewMut<'_>, alpha: f64) {
    for v in a.data_mut().iter_mut() {
        *v *= alpha;
    }
}

/// `a(i,i) += alpha` for `i < min(rows, cols)`.
pub fn add_diagonal(a: &mut MatrixViewMut<'_>, alpha: f64) {
    let d = a.rows().min(a.cols());
    for i in 0..d {
        let v = a.get(i, i) + alpha;
        a.set(i, i, v);
    }
}

/// In-place lower-triangular Cholesky factorization.
///
/// `min_pivot` is the floor below which a diagonal entry is treated as a
/// factorization failure; `min_pivot = 0.0` is the strict positive-
/// definiteness check. The upper triangle is left unmodified (garbage).
pub fn cholesky_factorize(a: &mut MatrixViewMut<'_>, min_pivot: f64) -> Result<(), LinAlgError> {
    let n = a.rows();
    debug_assert_eq!(a.rows(), a.cols(), "cholesky requires a square matrix");

    for j in 0..n {
        for k in 0..j {
            let ajk = a.get(j, k);
            for i in j..n {
                let v = a.get(i, j) - a.get(i, k) * ajk;
                a.set(i, j, v);
            }
        }
        let pivot = a.get(j, j);
        if pivot <= min_pivot {
            tracing::warn!(col = j, pivot, "cholesky_factorize: non-positive pivot");
            return Err(LinAlgError::CholeskyFailed);
        }
        let root = pivot.sqrt();
        for i in j..n {
            let v = a.get(i, j) / root;
            a.set(i, j, v);
        }
    }
    Ok(())
}

/// Solves `L x = b` (`transposed = false`) or `L^T x = b` (`transposed =
/// true`) in place in `b`. `b` may carry multiple right-hand-side columns,
/// solved independently. `L`'s upper triangle is never read.
pub fn lower_tri_back_sub(l: MatrixView<'_>, b: &mut MatrixViewMut<'_>, transposed: bool) -> Result<(), LinAlgError> {
    let n = l.rows();
    if l.cols() != n || b.rows() != n {
        return Err(LinAlgError::ShapeMismatch);
    }

    for col in 0..b.cols() {
        if !transposed {
            for i in 0..n {
                let mut sum = b.get(i, col);
                for k in 0..i {
                    sum -= l.get(i, k) * b.get(k, col);
                }
                b.set(i, col, sum / l.get(i, i));
            }
        } else {
            for i in (0..n).rev() {
                let mut sum = b.get(i, col);
                for j in (i + 1)..n {
                    sum -= l.get(j, i) * b.get(j, col);
                }
                b.set(i, col, sum / l.get(i, i));
            }
        }
    }
    Ok(())
}

/// `CholeskySolve(L, b)` = forward substitution then back substitution.
pub fn cholesky_solve(l: MatrixView<'_>, b: &mut MatrixViewMut<'_>) -> Result<(), LinAlgError> {
    lower_tri_back_sub(l, b, false)?;
    lower_tri_back_sub(l, b, true)
}

/// Euclidean (ℓ²) norm.
pub fn two_norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// True ℓ¹ norm (sum of absolute values).
pub fn one_norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v.abs()).sum()
}
