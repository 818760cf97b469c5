//! Subspace algebra: tolerance-aware primitives over real matrices
//!
//! Every operation in this module is built on the singular value
//! decomposition, with singular values compared against a tolerance to
//! separate "numerically zero" from "significant". Subspaces are represented
//! by matrices whose columns form an orthonormal basis; the zero subspace is
//! a matrix with the correct row count and zero columns, never an absent
//! value.
//!
//! All operations accept an optional tolerance override. When callers compose
//! several primitives over related matrices (as the invariant-subspace
//! iteration in [`crate::geometric`] does), they should compute one tolerance
//! up front and pass it to every call so that rank decisions stay consistent
//! across the whole computation.

use ndarray::{concatenate, s, Array2, Axis};
use ndarray_linalg::SVD;

use crate::error::{Error, Result};

/// Default tolerance for rank and null-space decisions on `m`.
///
/// Computed as `max(rows, cols) * spectral_norm(m) * f64::EPSILON`, the
/// standard cutoff used by numerical rank estimators. The spectral norm is
/// the largest singular value. An empty matrix has tolerance `0.0`.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use geoctrl_rs::subspace::tolerance;
///
/// let m = arr2(&[[2.0, 0.0], [0.0, 1.0]]);
/// let tol = tolerance(&m).unwrap();
/// assert!(tol > 0.0 && tol < 1e-12);
/// ```
pub fn tolerance(m: &Array2<f64>) -> Result<f64> {
    if m.nrows() == 0 || m.ncols() == 0 {
        return Ok(0.0);
    }
    let (_, sv, _) = m.svd(false, false)?;
    let spectral_norm = sv.iter().cloned().fold(0.0, f64::max);
    Ok(m.nrows().max(m.ncols()) as f64 * spectral_norm * f64::EPSILON)
}

/// Numerical rank of `m`: the number of singular values strictly above `tol`.
///
/// # Arguments
///
/// * `m` - Matrix whose rank is computed
/// * `tol` - Cutoff for "numerically zero" singular values; `None` uses
///   [`tolerance`]
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use geoctrl_rs::subspace::rank;
///
/// let m = arr2(&[[1.0, 2.0], [2.0, 4.0]]);
/// assert_eq!(rank(&m, None).unwrap(), 1);
/// ```
pub fn rank(m: &Array2<f64>, tol: Option<f64>) -> Result<usize> {
    if m.nrows() == 0 || m.ncols() == 0 {
        return Ok(0);
    }
    let tol = resolve_tol(m, tol)?;
    let (_, sv, _) = m.svd(false, false)?;
    Ok(sv.iter().filter(|&&s| s > tol).count())
}

/// Orthonormal basis of the column space of `m`.
///
/// Returns the left singular vectors whose singular values exceed `tol`, as
/// the columns of an n×r matrix where r is the numerical rank. A rank-zero
/// input yields an n×0 matrix.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use geoctrl_rs::subspace::basis;
///
/// let m = arr2(&[[1.0, 2.0], [2.0, 4.0], [0.0, 0.0]]);
/// let q = basis(&m, None).unwrap();
/// assert_eq!(q.shape(), &[3, 1]);
/// ```
pub fn basis(m: &Array2<f64>, tol: Option<f64>) -> Result<Array2<f64>> {
    if m.nrows() == 0 || m.ncols() == 0 {
        return Ok(Array2::zeros((m.nrows(), 0)));
    }
    let tol = resolve_tol(m, tol)?;
    let (u, sv, _) = m.svd(true, false)?;
    let u = u.ok_or(Error::Internal("SVD did not return the U factor"))?;
    let r = sv.iter().filter(|&&s| s > tol).count();
    Ok(u.slice(s![.., ..r]).to_owned())
}

/// Orthonormal basis of the null space of `m`.
///
/// Returns the right singular vectors whose singular values are at or below
/// `tol`, as the columns of a c×(c−r) matrix where c is the column count of
/// `m` and r its numerical rank. A full-rank input yields a c×0 matrix.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use geoctrl_rs::subspace::kernel;
///
/// // Ker([1, 0]) is the span of e2.
/// let c = arr2(&[[1.0, 0.0]]);
/// let k = kernel(&c, None).unwrap();
/// assert_eq!(k.shape(), &[2, 1]);
/// assert!(k[[0, 0]].abs() < 1e-12);
/// ```
pub fn kernel(m: &Array2<f64>, tol: Option<f64>) -> Result<Array2<f64>> {
    if m.ncols() == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    if m.nrows() == 0 {
        // A map from R^c to R^0 annihilates everything.
        return Ok(Array2::eye(m.ncols()));
    }
    let tol = resolve_tol(m, tol)?;
    let (_, sv, vt) = m.svd(false, true)?;
    let vt = vt.ok_or(Error::Internal("SVD did not return the Vᵀ factor"))?;
    let r = sv.iter().filter(|&&s| s > tol).count();
    Ok(vt.slice(s![r.., ..]).t().to_owned())
}

/// Orthonormal basis of span(a) ∩ span(b).
///
/// Formed from the null space of the horizontal concatenation `[a, −b]`: any
/// null vector `[u; v]` satisfies `a·u = b·v`, so the intersection is spanned
/// by `a·u` over the null-space basis. The result is re-orthonormalized via
/// [`basis`]. If either operand has zero columns the intersection is the zero
/// subspace with `a`'s row count.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] when the operands have different row
/// counts.
pub fn intersection(a: &Array2<f64>, b: &Array2<f64>, tol: Option<f64>) -> Result<Array2<f64>> {
    check_same_rows(a, b, "intersection")?;
    if a.ncols() == 0 || b.ncols() == 0 {
        return Ok(Array2::zeros((a.nrows(), 0)));
    }
    let m = concatenate![Axis(1), a.view(), b.mapv(|x| -x).view()];
    let k = kernel(&m, tol)?;
    if k.ncols() == 0 {
        return Ok(Array2::zeros((a.nrows(), 0)));
    }
    let coeffs_a = k.slice(s![..a.ncols(), ..]).to_owned();
    basis(&a.dot(&coeffs_a), tol)
}

/// Orthonormal basis of span(a) + span(b).
///
/// Simply `basis([a, b])`; an empty operand reduces to `basis` of the other.
pub fn sum_spaces(a: &Array2<f64>, b: &Array2<f64>, tol: Option<f64>) -> Result<Array2<f64>> {
    check_same_rows(a, b, "sum_spaces")?;
    if a.ncols() == 0 {
        return basis(b, tol);
    }
    if b.ncols() == 0 {
        return basis(a, tol);
    }
    basis(&concatenate![Axis(1), a.view(), b.view()], tol)
}

/// Orthonormal basis of the preimage A⁻¹(span(s)) = {x : A·x ∈ span(s)}.
///
/// When `s` is the zero subspace this is exactly `kernel(a)`. Otherwise the
/// null space of `[a, −s]` holds stacked vectors `[x; y]` with `a·x = s·y`;
/// the x-block (the coefficient rows belonging to `a`'s columns) already
/// lives in the domain of A, so its re-orthonormalized span is the preimage.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] when `s` does not have as many rows
/// as `a`.
pub fn inverse_image(a: &Array2<f64>, s_sub: &Array2<f64>, tol: Option<f64>) -> Result<Array2<f64>> {
    check_same_rows(a, s_sub, "inverse_image")?;
    if s_sub.ncols() == 0 {
        return kernel(a, tol);
    }
    let m = concatenate![Axis(1), a.view(), s_sub.mapv(|x| -x).view()];
    let k = kernel(&m, tol)?;
    if k.ncols() == 0 {
        return Ok(Array2::zeros((a.ncols(), 0)));
    }
    let x_block = k.slice(s![..a.ncols(), ..]).to_owned();
    basis(&x_block, tol)
}

fn resolve_tol(m: &Array2<f64>, tol: Option<f64>) -> Result<f64> {
    match tol {
        Some(t) => Ok(t),
        None => tolerance(m),
    }
}

fn check_same_rows(a: &Array2<f64>, b: &Array2<f64>, op: &str) -> Result<()> {
    if a.nrows() != b.nrows() {
        return Err(Error::DimensionMismatch(format!(
            "{}: operands have {} and {} rows",
            op,
            a.nrows(),
            b.nrows()
        )));
    }
    Ok(())
}
