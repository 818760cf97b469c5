//! Crate-wide error type.
//!
//! Bad inputs are rejected before any numerical or symbolic work starts:
//! mutually inconsistent matrix/vector-field dimensions and malformed
//! expression strings each map to a dedicated variant. Rank-deficient or
//! singular matrices are *not* errors anywhere in this crate; they are
//! handled through tolerance-based SVD cutoffs.

use thiserror::Error;

/// Errors reported by the geometric and symbolic routines.
#[derive(Debug, Error)]
pub enum Error {
    /// Matrices or symbolic lists whose sizes are mutually inconsistent.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An expression string could not be parsed under the expression grammar.
    #[error("parse error: {0}")]
    Parse(String),

    /// A LAPACK decomposition failed to converge or was otherwise rejected.
    #[error(transparent)]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    /// The decomposition backend violated its own contract.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
