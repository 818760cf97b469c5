//! geoctrl-rs: geometric control theory routines in Rust
//!
//! This crate computes structural properties of linear and nonlinear control
//! systems: maximal controlled-invariant subspaces, solvability of the
//! disturbance decoupling problem together with a decoupling feedback, and
//! the relative degree of single-input single-output nonlinear systems via
//! symbolic Lie derivatives.
//!
//! # Organization
//!
//! - `subspace`: tolerance-aware subspace primitives (rank, basis, kernel,
//!   intersection, sum, inverse image), all built on the singular value
//!   decomposition
//! - `geometric`: the V* fixed-point iteration, the disturbance-decoupling
//!   solvability test, and feedback synthesis
//! - `symbolic`: expression parsing, symbolic differentiation, and the
//!   iterative relative-degree computation
//! - `error`: the crate error type (dimension mismatches, parse failures)
//!
//! Everything is a pure, synchronous function over immutable inputs; no
//! state is shared between invocations, so all routines are safe to call
//! from concurrent contexts.
//!
//! # Example
//!
//! ```
//! use ndarray::arr2;
//! use geoctrl_rs::geometric::check_disturbance_decoupling;
//!
//! let a = arr2(&[[0.0, 1.0], [2.0, 0.0]]);
//! let b = arr2(&[[0.0], [1.0]]);
//! let c = arr2(&[[1.0, -1.0]]);
//! let e = arr2(&[[1.0], [1.0]]);
//!
//! let result = check_disturbance_decoupling(&a, &b, &e, &c, None).unwrap();
//! assert!(result.solvable);
//! assert_eq!(result.v_star.nrows(), 2);
//! ```

pub mod error;
pub mod geometric;
pub mod subspace;
pub mod symbolic;

pub use error::Error;
