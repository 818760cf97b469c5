//! Relative-degree analysis of SISO nonlinear systems
//!
//! For a system ẋ = f(x) + g(x)·u, y = h(x) over state variables
//! x = (x₁, …, xₙ), the relative degree r is the smallest number of output
//! differentiations after which the input first appears: the smallest r with
//! L_g L_f^{r−1} h ≠ 0, where L_v φ = Σᵢ (∂φ/∂xᵢ)·vᵢ is the Lie derivative
//! of a scalar along a vector field.
//!
//! The analyzer is purely symbolic: expressions are parsed by
//! [`parse`], differentiated per variant, and zero-tested by
//! [`Expr::simplify`]. A system whose iterates stay in the kernel of L_g up
//! to order n+1 has no well-defined relative degree within the state
//! dimension; that is a normal analytical outcome, reported as such rather
//! than as an error.

mod expr;
mod parser;

pub use expr::{Expr, Func};
pub use parser::parse;

use crate::error::{Error, Result};

/// Outcome of a relative-degree computation.
///
/// `degree` is `None` when no iterate up to order n+1 produced a nonzero
/// L_g L_f^{r−1} h; `message` then explains the outcome for display layers.
#[derive(Debug, Clone)]
pub struct RelativeDegreeReport {
    /// The relative degree, when well-defined.
    pub degree: Option<usize>,
    /// The first nonzero L_g L_f^{r−1} h, simplified and rendered.
    pub lg_lf_h: Option<String>,
    /// The intermediate f-iterates L_f⁰h, …, L_f^{r−2}h, in order.
    pub lie_derivatives: Vec<String>,
    /// Human-readable note for the undefined case.
    pub message: Option<String>,
}

/// Lie derivative of `phi` along `field`: Σᵢ (∂phi/∂xᵢ)·fieldᵢ.
///
/// The result is returned unsimplified; callers decide when to pay for
/// simplification. `field` and `vars` are expected to have equal length
/// (enforced by [`relative_degree`] at the boundary).
pub fn lie_derivative(phi: &Expr, field: &[Expr], vars: &[String]) -> Expr {
    let terms = vars
        .iter()
        .zip(field)
        .map(|(var, component)| Expr::Product(vec![phi.diff(var), component.clone()]))
        .collect();
    Expr::Sum(terms)
}

/// Computes the relative degree of a SISO nonlinear system.
///
/// # Arguments
///
/// * `f_exprs` - Drift vector field, one expression string per state variable
/// * `g_exprs` - Input vector field, one expression string per state variable
/// * `h_expr` - Scalar output map
/// * `var_names` - Ordered state variable names; the order defines both
///   parsing and differentiation order
///
/// # Errors
///
/// * [`Error::DimensionMismatch`] when `f_exprs` or `g_exprs` do not have one
///   entry per state variable
/// * [`Error::Parse`] when any expression string is rejected by the grammar
///
/// Both are detected before any Lie-derivative iteration starts. An
/// undefined relative degree is *not* an error; it is reported through
/// [`RelativeDegreeReport::degree`] being `None`.
///
/// # Examples
///
/// ```
/// use geoctrl_rs::symbolic::relative_degree;
///
/// // Double integrator: y must be differentiated twice before u appears.
/// let report = relative_degree(&["x2", "0"], &["0", "1"], "x1", &["x1", "x2"]).unwrap();
/// assert_eq!(report.degree, Some(2));
/// assert_eq!(report.lg_lf_h.as_deref(), Some("1"));
/// ```
pub fn relative_degree(
    f_exprs: &[&str],
    g_exprs: &[&str],
    h_expr: &str,
    var_names: &[&str],
) -> Result<RelativeDegreeReport> {
    let n = var_names.len();
    if f_exprs.len() != n || g_exprs.len() != n {
        return Err(Error::DimensionMismatch(format!(
            "vector fields must have one entry per state variable: |f| = {}, |g| = {}, n = {}",
            f_exprs.len(),
            g_exprs.len(),
            n
        )));
    }

    let vars: Vec<String> = var_names.iter().map(|s| s.to_string()).collect();
    let f: Vec<Expr> = f_exprs.iter().map(|s| parse(s)).collect::<Result<_>>()?;
    let g: Vec<Expr> = g_exprs.iter().map(|s| parse(s)).collect::<Result<_>>()?;
    let h = parse(h_expr)?;

    let mut lf_h = h;
    let mut history = Vec::new();
    for r in 1..=n + 1 {
        let current = lf_h.simplify();
        let lg = lie_derivative(&current, &g, &vars).simplify();
        if !lg.is_zero() {
            return Ok(RelativeDegreeReport {
                degree: Some(r),
                lg_lf_h: Some(lg.to_string()),
                lie_derivatives: history,
                message: None,
            });
        }
        // The input has not surfaced yet; differentiate the output once more
        // along the drift field.
        lf_h = lie_derivative(&current, &f, &vars);
        history.push(current.to_string());
    }

    Ok(RelativeDegreeReport {
        degree: None,
        lg_lf_h: None,
        lie_derivatives: history,
        message: Some(
            "relative degree is not well-defined within the state dimension".to_string(),
        ),
    })
}
