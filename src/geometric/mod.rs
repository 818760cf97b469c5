//! Geometric control: controlled-invariant subspaces, disturbance
//! decoupling, and feedback synthesis
//!
//! The routines here form a strict pipeline over the primitives in
//! [`crate::subspace`]:
//!
//! 1. [`compute_v_star`]: fixed-point iteration for the maximal
//!    controlled-invariant subspace V* contained in Ker(C)
//! 2. [`check_disturbance_decoupling`]: solvability of the disturbance
//!    decoupling problem (DDP) via a subspace-inclusion test against V*
//! 3. [`compute_feedback_matrix`]: a feedback F with (A + B·F)·V* ⊆ V*
//!
//! One numerical tolerance is derived per top-level call and threaded through
//! every primitive invocation, so that rank decisions are consistent across
//! the whole computation.

use log::debug;
use ndarray::{concatenate, s, Array2, Axis};
use ndarray_linalg::SVD;

use crate::error::{Error, Result};
use crate::subspace::{basis, intersection, inverse_image, kernel, rank, sum_spaces, tolerance};

/// Outcome of a disturbance-decoupling analysis.
///
/// `feedback` is present exactly when the problem is solvable; `v_star`
/// always carries the maximal controlled-invariant subspace contained in
/// Ker(C), as an orthonormal basis (n rows, possibly zero columns).
#[derive(Debug, Clone)]
pub struct DecouplingResult {
    /// Whether a decoupling feedback exists (Im(E) ⊆ V*).
    pub solvable: bool,
    /// Orthonormal basis of V*.
    pub v_star: Array2<f64>,
    /// An m×n feedback with (A + B·F)·V* ⊆ V*, when solvable.
    pub feedback: Option<Array2<f64>>,
}

/// Computes the maximal controlled-invariant subspace V* contained in Ker(C).
///
/// V* is the largest subspace V with A·V ⊆ V + Im(B). It is found by the
/// standard fixed-point iteration
///
/// ```text
/// V₀     = Ker(C)
/// V_{k+1} = V_k ∩ A⁻¹(V_k + Im(B))
/// ```
///
/// Each iterate is contained in the previous one, so the dimension sequence
/// is non-increasing; the loop stops as soon as the dimension stops
/// decreasing (equal dimension plus the subset relation implies equality) and
/// is bounded by n+1 passes, since the dimension can fall at most n times.
///
/// # Arguments
///
/// * `a` - n×n state matrix
/// * `b` - n×m input matrix
/// * `c` - p×n output matrix
/// * `tol` - Rank cutoff threaded through every subspace primitive; `None`
///   derives one tolerance from A, B and C
///
/// # Returns
///
/// An orthonormal basis of V* (n rows; zero columns for the zero subspace).
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use geoctrl_rs::geometric::compute_v_star;
///
/// // Integrator chain: y = x1, ẋ1 = x2, ẋ2 = u. V* is the zero subspace.
/// let a = arr2(&[[0.0, 1.0], [0.0, 0.0]]);
/// let b = arr2(&[[0.0], [1.0]]);
/// let c = arr2(&[[1.0, 0.0]]);
/// let v_star = compute_v_star(&a, &b, &c, None).unwrap();
/// assert_eq!(v_star.shape(), &[2, 0]);
/// ```
pub fn compute_v_star(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    tol: Option<f64>,
) -> Result<Array2<f64>> {
    validate_linear_system(a, b, c, None)?;
    let tol = match tol {
        Some(t) => t,
        None => problem_tolerance(&[a, b, c])?,
    };
    let (v_star, _) = v_star_iterates(a, b, c, tol)?;
    Ok(v_star)
}

/// Fixed-point iteration returning V* together with the dimension of every
/// iterate, V₀ included. The trace is what the unit tests check the
/// monotone-descent invariant against.
fn v_star_iterates(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    tol: f64,
) -> Result<(Array2<f64>, Vec<usize>)> {
    let n = a.nrows();
    let im_b = basis(b, Some(tol))?;
    let mut v = kernel(c, Some(tol))?;
    let mut dims = vec![v.ncols()];

    // Dimension can decrease at most n times, so n+1 passes always suffice.
    for k in 0..=n {
        let s_sum = sum_spaces(&v, &im_b, Some(tol))?;
        let pre = inverse_image(a, &s_sum, Some(tol))?;
        let v_next = intersection(&v, &pre, Some(tol))?;
        debug!(
            "V* iteration {}: dim {} -> {}",
            k,
            v.ncols(),
            v_next.ncols()
        );
        dims.push(v_next.ncols());
        if v_next.ncols() == v.ncols() {
            return Ok((v_next, dims));
        }
        v = v_next;
    }
    Ok((v, dims))
}

/// Decides solvability of the disturbance decoupling problem.
///
/// For the system ẋ = A·x + B·u + E·w, y = C·x, a feedback u = F·x
/// rendering the output insensitive to the disturbance w exists if and only
/// if Im(E) ⊆ V*, the maximal controlled-invariant subspace in Ker(C).
///
/// The inclusion is tested by rank: rank([V*, Im(E)]) == rank(V*) means every
/// column of Im(E) is already representable in span(V*). A disturbance matrix
/// of numerical rank zero makes the problem trivially solvable, with the m×n
/// zero matrix as placeholder feedback. When solvable, the feedback is
/// produced by [`compute_feedback_matrix`]; when not, no feedback is defined.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use geoctrl_rs::geometric::check_disturbance_decoupling;
///
/// let a = arr2(&[[0.0, 1.0], [2.0, 0.0]]);
/// let b = arr2(&[[0.0], [1.0]]);
/// let c = arr2(&[[1.0, -1.0]]);
/// let e = arr2(&[[1.0], [1.0]]);
/// let result = check_disturbance_decoupling(&a, &b, &e, &c, None).unwrap();
/// assert!(result.solvable);
/// ```
pub fn check_disturbance_decoupling(
    a: &Array2<f64>,
    b: &Array2<f64>,
    e: &Array2<f64>,
    c: &Array2<f64>,
    tol: Option<f64>,
) -> Result<DecouplingResult> {
    validate_linear_system(a, b, c, Some(e))?;
    let tol = match tol {
        Some(t) => t,
        None => problem_tolerance(&[a, b, c, e])?,
    };
    let n = a.nrows();
    let m = b.ncols();

    let (v_star, _) = v_star_iterates(a, b, c, tol)?;
    let im_e = basis(e, Some(tol))?;

    if im_e.ncols() == 0 {
        // The disturbance has no effect at all.
        return Ok(DecouplingResult {
            solvable: true,
            v_star,
            feedback: Some(Array2::zeros((m, n))),
        });
    }

    let combined = concatenate![Axis(1), v_star.view(), im_e.view()];
    let rank_v = rank(&v_star, Some(tol))?;
    let rank_combined = rank(&combined, Some(tol))?;
    debug!(
        "DDP inclusion test: rank(V*) = {}, rank([V*, Im(E)]) = {}",
        rank_v, rank_combined
    );

    if rank_combined != rank_v {
        return Ok(DecouplingResult {
            solvable: false,
            v_star,
            feedback: None,
        });
    }

    let feedback = compute_feedback_matrix(a, b, &v_star, Some(tol))?;
    Ok(DecouplingResult {
        solvable: true,
        v_star,
        feedback: Some(feedback),
    })
}

/// Constructs a feedback F with (A + B·F)·V* ⊆ V*.
///
/// `v_star` must be an orthonormal basis of a controlled-invariant subspace
/// (as produced by [`compute_v_star`]), so for every basis column vᵢ the
/// system `[V* | B]·[x; y] = A·vᵢ` has a solution. It is solved in the
/// least-squares sense through an SVD pseudoinverse with `tol` as rank
/// cutoff, which absorbs any redundancy between span(V*) and Im(B). Writing
/// the negated B-coefficient block −y into column i of an m×k matrix U gives
///
/// ```text
/// F = U · V*ᵀ
/// ```
///
/// valid because V* has orthonormal columns, so its pseudoinverse is its
/// transpose. F acts as U on V* and as zero on the orthogonal complement;
/// any other extension off V* would satisfy the invariance contract equally
/// well.
///
/// # Returns
///
/// The m×n feedback matrix; the zero matrix when V* has no columns.
pub fn compute_feedback_matrix(
    a: &Array2<f64>,
    b: &Array2<f64>,
    v_star: &Array2<f64>,
    tol: Option<f64>,
) -> Result<Array2<f64>> {
    let n = a.nrows();
    let m = b.ncols();
    if a.ncols() != n {
        return Err(Error::DimensionMismatch(format!(
            "A must be square, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    if b.nrows() != n || v_star.nrows() != n {
        return Err(Error::DimensionMismatch(format!(
            "B and V* must have {} rows, got {} and {}",
            n,
            b.nrows(),
            v_star.nrows()
        )));
    }
    let k = v_star.ncols();
    if k == 0 {
        // Nothing to hold invariant.
        return Ok(Array2::zeros((m, n)));
    }
    let tol = match tol {
        Some(t) => t,
        None => problem_tolerance(&[a, b, v_star])?,
    };

    // One pseudoinverse of [V* | B] serves all k right-hand sides A·vᵢ.
    let stacked = concatenate![Axis(1), v_star.view(), b.view()];
    let pinv = pseudo_inverse(&stacked, tol)?;
    let rhs = a.dot(v_star);
    let coeffs = pinv.dot(&rhs);

    // Rows k.. are the B-coefficients y; U holds −y per column.
    let u = coeffs.slice(s![k.., ..]).mapv(|y| -y);
    Ok(u.dot(&v_star.t()))
}

/// Moore-Penrose pseudoinverse with an explicit singular-value cutoff.
fn pseudo_inverse(m: &Array2<f64>, tol: f64) -> Result<Array2<f64>> {
    let (u, sv, vt) = m.svd(true, true)?;
    let u = u.ok_or(Error::Internal("SVD did not return the U factor"))?;
    let vt = vt.ok_or(Error::Internal("SVD did not return the Vᵀ factor"))?;
    let r = sv.iter().filter(|&&s| s > tol).count();
    if r == 0 {
        return Ok(Array2::zeros((m.ncols(), m.nrows())));
    }
    // pinv = V_r · diag(1/σ) · U_rᵀ
    let mut v_scaled = vt.slice(s![..r, ..]).t().to_owned();
    for (j, &s_val) in sv.iter().take(r).enumerate() {
        v_scaled.column_mut(j).mapv_inplace(|x| x / s_val);
    }
    Ok(v_scaled.dot(&u.slice(s![.., ..r]).t()))
}

/// One tolerance for a whole problem instance: the largest per-matrix
/// default among the system matrices, so rank decisions agree across every
/// primitive call in a single computation.
fn problem_tolerance(matrices: &[&Array2<f64>]) -> Result<f64> {
    let mut tol = 0.0f64;
    for m in matrices {
        tol = tol.max(tolerance(m)?);
    }
    Ok(tol)
}

fn validate_linear_system(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    e: Option<&Array2<f64>>,
) -> Result<()> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(Error::DimensionMismatch(format!(
            "A must be square, got {}x{}",
            n,
            a.ncols()
        )));
    }
    if b.nrows() != n {
        return Err(Error::DimensionMismatch(format!(
            "B must have {} rows, got {}",
            n,
            b.nrows()
        )));
    }
    if c.ncols() != n {
        return Err(Error::DimensionMismatch(format!(
            "C must have {} columns, got {}",
            n,
            c.ncols()
        )));
    }
    if let Some(e) = e {
        if e.nrows() != n {
            return Err(Error::DimensionMismatch(format!(
                "E must have {} rows, got {}",
                n,
                e.nrows()
            )));
        }
    }
    Ok(())
}
