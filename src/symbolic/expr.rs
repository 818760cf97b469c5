//! Symbolic expression tree: differentiation, simplification, formatting.
//!
//! Expressions are tagged variants over real constants, variables, n-ary
//! sums and products, powers, and a fixed set of named functions. Sums and
//! products are kept n-ary so simplification can flatten, fold constants and
//! collect like terms in one pass; negation and division are encoded as
//! multiplication by −1 and powers with exponent −1.

use std::collections::BTreeMap;
use std::fmt;

/// Named unary functions admitted by the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl Func {
    /// Maps a grammar-level function name onto its variant. Both `ln` and
    /// `log` denote the natural logarithm.
    pub fn from_name(name: &str) -> Option<Func> {
        match name {
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "exp" => Some(Func::Exp),
            "ln" | "log" => Some(Func::Ln),
            "sqrt" => Some(Func::Sqrt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Exp => "exp",
            Func::Ln => "log",
            Func::Sqrt => "sqrt",
        }
    }

    fn eval(&self, x: f64) -> Option<f64> {
        let y = match self {
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Exp => x.exp(),
            Func::Ln if x > 0.0 => x.ln(),
            Func::Sqrt if x >= 0.0 => x.sqrt(),
            _ => return None,
        };
        y.is_finite().then(|| y)
    }
}

/// A scalar symbolic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    Sum(Vec<Expr>),
    Product(Vec<Expr>),
    Power(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    fn neg(self) -> Expr {
        Expr::Product(vec![Expr::Num(-1.0), self])
    }

    fn pow(self, e: f64) -> Expr {
        Expr::Power(Box::new(self), Box::new(Expr::Num(e)))
    }

    /// True when the expression is the literal constant zero. Callers that
    /// want a semantic zero test must [`simplify`](Expr::simplify) first.
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(v) if *v == 0.0)
    }

    /// Partial derivative with respect to `var`, left unsimplified.
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Num(_) => Expr::Num(0.0),
            Expr::Var(name) => Expr::Num(if name == var { 1.0 } else { 0.0 }),
            Expr::Sum(terms) => Expr::Sum(terms.iter().map(|t| t.diff(var)).collect()),
            Expr::Product(factors) => {
                // n-ary product rule: Σᵢ fᵢ' · Πⱼ≠ᵢ fⱼ
                let terms = (0..factors.len())
                    .map(|i| {
                        Expr::Product(
                            factors
                                .iter()
                                .enumerate()
                                .map(|(j, f)| if i == j { f.diff(var) } else { f.clone() })
                                .collect(),
                        )
                    })
                    .collect();
                Expr::Sum(terms)
            }
            Expr::Power(base, exp) => match exp.as_ref() {
                Expr::Num(c) => Expr::Product(vec![
                    Expr::Num(*c),
                    Expr::Power(base.clone(), Box::new(Expr::Num(c - 1.0))),
                    base.diff(var),
                ]),
                _ => {
                    // b^e · (e'·log(b) + e·b'·b⁻¹)
                    let log_term =
                        Expr::Product(vec![exp.diff(var), Expr::Call(Func::Ln, base.clone())]);
                    let ratio_term = Expr::Product(vec![
                        exp.as_ref().clone(),
                        base.diff(var),
                        base.as_ref().clone().pow(-1.0),
                    ]);
                    Expr::Product(vec![self.clone(), Expr::Sum(vec![log_term, ratio_term])])
                }
            },
            Expr::Call(func, arg) => {
                let outer = match func {
                    Func::Sin => Expr::Call(Func::Cos, arg.clone()),
                    Func::Cos => Expr::Call(Func::Sin, arg.clone()).neg(),
                    Func::Tan => Expr::Call(Func::Cos, arg.clone()).pow(-2.0),
                    Func::Exp => Expr::Call(Func::Exp, arg.clone()),
                    Func::Ln => arg.as_ref().clone().pow(-1.0),
                    Func::Sqrt => {
                        Expr::Product(vec![Expr::Num(0.5), arg.as_ref().clone().pow(-0.5)])
                    }
                };
                Expr::Product(vec![outer, arg.diff(var)])
            }
        }
    }

    /// Rewrites the expression into a canonical-ish simplified form:
    /// constants folded, nested sums/products flattened, neutral elements
    /// dropped, zero products annihilated, like terms collected in sums and
    /// like bases merged in products, constant function applications
    /// evaluated.
    ///
    /// This is the zero test used by the relative-degree iteration; it is
    /// exact on everything it recognizes but may leave some nontrivial
    /// algebraic identities unresolved.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Num(_) | Expr::Var(_) => self.clone(),
            Expr::Sum(terms) => simplify_sum(terms),
            Expr::Product(factors) => simplify_product(factors),
            Expr::Power(base, exp) => simplify_power(base.simplify(), exp.simplify()),
            Expr::Call(func, arg) => match arg.simplify() {
                Expr::Num(v) => match func.eval(v) {
                    Some(y) => Expr::Num(y),
                    None => Expr::Call(*func, Box::new(Expr::Num(v))),
                },
                arg => Expr::Call(*func, Box::new(arg)),
            },
        }
    }
}

/// Splits a term into its numeric coefficient and non-numeric core.
/// `None` core means the term is a pure constant.
fn split_coefficient(term: Expr) -> (f64, Option<Expr>) {
    match term {
        Expr::Num(v) => (v, None),
        Expr::Product(factors) => {
            let mut coeff = 1.0;
            let mut rest = Vec::with_capacity(factors.len());
            for f in factors {
                match f {
                    Expr::Num(v) => coeff *= v,
                    other => rest.push(other),
                }
            }
            match rest.len() {
                0 => (coeff, None),
                1 => (coeff, rest.pop()),
                _ => (coeff, Some(Expr::Product(rest))),
            }
        }
        other => (1.0, Some(other)),
    }
}

fn simplify_sum(terms: &[Expr]) -> Expr {
    let mut flat = Vec::with_capacity(terms.len());
    for t in terms {
        match t.simplify() {
            Expr::Sum(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut constant = 0.0;
    // Like terms grouped by the display form of their core; BTreeMap keeps
    // the rebuilt order deterministic.
    let mut groups: BTreeMap<String, (f64, Expr)> = BTreeMap::new();
    for term in flat {
        let (coeff, core) = split_coefficient(term);
        match core {
            None => constant += coeff,
            Some(core) => {
                let entry = groups
                    .entry(core.to_string())
                    .or_insert_with(|| (0.0, core));
                entry.0 += coeff;
            }
        }
    }

    let mut rebuilt = Vec::with_capacity(groups.len() + 1);
    for (_, (coeff, core)) in groups {
        if coeff == 0.0 {
            continue;
        }
        if coeff == 1.0 {
            rebuilt.push(core);
        } else if let Expr::Product(mut factors) = core {
            factors.insert(0, Expr::Num(coeff));
            rebuilt.push(Expr::Product(factors));
        } else {
            rebuilt.push(Expr::Product(vec![Expr::Num(coeff), core]));
        }
    }
    if constant != 0.0 {
        rebuilt.push(Expr::Num(constant));
    }

    match rebuilt.len() {
        0 => Expr::Num(0.0),
        1 => rebuilt.pop().unwrap_or(Expr::Num(0.0)),
        _ => Expr::Sum(rebuilt),
    }
}

fn simplify_product(factors: &[Expr]) -> Expr {
    let mut flat = Vec::with_capacity(factors.len());
    for f in factors {
        match f.simplify() {
            Expr::Product(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut coeff = 1.0;
    // Bases with numeric exponents merge by summing exponents; anything with
    // a symbolic exponent passes through untouched.
    let mut powers: BTreeMap<String, (Expr, f64)> = BTreeMap::new();
    let mut opaque = Vec::new();
    for f in flat {
        match f {
            Expr::Num(v) => coeff *= v,
            Expr::Power(base, exp) => match *exp {
                Expr::Num(e) => {
                    let entry = powers
                        .entry(base.to_string())
                        .or_insert_with(|| ((*base).clone(), 0.0));
                    entry.1 += e;
                }
                exp => opaque.push(Expr::Power(base, Box::new(exp))),
            },
            other => {
                let entry = powers
                    .entry(other.to_string())
                    .or_insert_with(|| (other.clone(), 0.0));
                entry.1 += 1.0;
            }
        }
    }

    if coeff == 0.0 {
        return Expr::Num(0.0);
    }

    let mut rebuilt = Vec::with_capacity(powers.len() + opaque.len() + 1);
    for (_, (base, exp)) in powers {
        if exp == 0.0 {
            continue;
        }
        if exp == 1.0 {
            rebuilt.push(base);
        } else {
            rebuilt.push(base.pow(exp));
        }
    }
    rebuilt.extend(opaque);

    if rebuilt.is_empty() {
        return Expr::Num(coeff);
    }
    if coeff != 1.0 {
        rebuilt.insert(0, Expr::Num(coeff));
    }
    match rebuilt.len() {
        1 => rebuilt.pop().unwrap_or(Expr::Num(1.0)),
        _ => Expr::Product(rebuilt),
    }
}

fn simplify_power(base: Expr, exp: Expr) -> Expr {
    if let Expr::Num(e) = exp {
        if e == 0.0 {
            return Expr::Num(1.0);
        }
        if e == 1.0 {
            return base;
        }
        if let Expr::Num(b) = base {
            let v = b.powf(e);
            if v.is_finite() {
                return Expr::Num(v);
            }
        }
        return Expr::Power(Box::new(base), Box::new(Expr::Num(e)));
    }
    if let Expr::Num(b) = base {
        if b == 1.0 {
            return Expr::Num(1.0);
        }
        return Expr::Power(Box::new(Expr::Num(b)), Box::new(exp));
    }
    Expr::Power(Box::new(base), Box::new(exp))
}

// --- Formatting ------------------------------------------------------------

fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Sum(_) => 1,
        Expr::Product(_) => 2,
        Expr::Power(_, _) => 3,
        Expr::Num(v) if *v < 0.0 => 2,
        _ => 4,
    }
}

fn fmt_operand(e: &Expr, min_prec: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if precedence(e) < min_prec {
        write!(f, "({})", e)
    } else {
        write!(f, "{}", e)
    }
}

/// True when the term renders with a leading minus sign.
fn has_negative_lead(e: &Expr) -> bool {
    match e {
        Expr::Num(v) => *v < 0.0,
        Expr::Product(factors) => matches!(factors.first(), Some(Expr::Num(v)) if *v < 0.0),
        _ => false,
    }
}

/// The same term with its leading coefficient negated; display only.
fn negated(e: &Expr) -> Expr {
    match e {
        Expr::Num(v) => Expr::Num(-v),
        Expr::Product(factors) => {
            if let Some(Expr::Num(v)) = factors.first() {
                let mut rest: Vec<Expr> = factors[1..].to_vec();
                if -v == 1.0 && rest.len() == 1 {
                    return rest.pop().unwrap_or(Expr::Num(1.0));
                }
                if -v == 1.0 {
                    return Expr::Product(rest);
                }
                rest.insert(0, Expr::Num(-v));
                return Expr::Product(rest);
            }
            Expr::Product(factors.clone()).neg()
        }
        other => other.clone().neg(),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(v) => {
                // Integer-valued constants print without a fraction part.
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{}", v)
                }
            }
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{}", term)?;
                    } else if has_negative_lead(term) {
                        write!(f, " - {}", negated(term))?;
                    } else {
                        write!(f, " + {}", term)?;
                    }
                }
                Ok(())
            }
            Expr::Product(factors) => {
                let mut rest = factors.as_slice();
                if let Some(Expr::Num(v)) = factors.first() {
                    if *v == -1.0 && factors.len() > 1 {
                        write!(f, "-")?;
                        rest = &factors[1..];
                    }
                }
                for (i, factor) in rest.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    fmt_operand(factor, 2, f)?;
                }
                Ok(())
            }
            Expr::Power(base, exp) => {
                fmt_operand(base, 4, f)?;
                write!(f, "^")?;
                fmt_operand(exp, 4, f)
            }
            Expr::Call(func, arg) => write!(f, "{}({})", func.name(), arg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn derivative_of_variable() {
        assert_eq!(x().diff("x").simplify(), Expr::Num(1.0));
        assert_eq!(x().diff("y").simplify(), Expr::Num(0.0));
    }

    #[test]
    fn product_rule() {
        // d/dx (x * sin(x)) = x*cos(x) + sin(x), factors in canonical order
        let e = Expr::Product(vec![x(), Expr::Call(Func::Sin, Box::new(x()))]);
        let d = e.diff("x").simplify();
        assert_eq!(d.to_string(), "cos(x)*x + sin(x)");
    }

    #[test]
    fn power_rule_with_numeric_exponent() {
        let e = x().pow(3.0);
        assert_eq!(e.diff("x").simplify().to_string(), "3*x^2");
    }

    #[test]
    fn chain_rule_through_cos() {
        // d/dx cos(x^2) = -2*x*sin(x^2), factors in canonical order
        let e = Expr::Call(Func::Cos, Box::new(x().pow(2.0)));
        assert_eq!(e.diff("x").simplify().to_string(), "-2*sin(x^2)*x");
    }

    #[test]
    fn like_terms_cancel_to_zero() {
        let e = Expr::Sum(vec![x(), x().neg()]);
        assert!(e.simplify().is_zero());
    }

    #[test]
    fn zero_factor_annihilates_product() {
        let e = Expr::Product(vec![
            Expr::Num(0.0),
            Expr::Call(Func::Exp, Box::new(x())),
        ]);
        assert!(e.simplify().is_zero());
    }

    #[test]
    fn like_bases_merge() {
        let e = Expr::Product(vec![x(), x()]);
        assert_eq!(e.simplify().to_string(), "x^2");
        let cancel = Expr::Product(vec![x(), x().pow(-1.0)]);
        assert_eq!(cancel.simplify(), Expr::Num(1.0));
    }

    #[test]
    fn constant_functions_fold() {
        let e = Expr::Call(Func::Sin, Box::new(Expr::Num(0.0)));
        assert_eq!(e.simplify(), Expr::Num(0.0));
        let e = Expr::Call(Func::Exp, Box::new(Expr::Num(0.0)));
        assert_eq!(e.simplify(), Expr::Num(1.0));
    }

    #[test]
    fn display_renders_subtraction() {
        let e = Expr::Sum(vec![x(), Expr::Product(vec![Expr::Num(-2.0), Expr::var("y")])]);
        assert_eq!(e.to_string(), "x - 2*y");
    }

    #[test]
    fn display_parenthesizes_sum_inside_product() {
        let e = Expr::Product(vec![Expr::Num(2.0), Expr::Sum(vec![x(), Expr::Num(1.0)])]);
        assert_eq!(e.to_string(), "2*(x + 1)");
    }
}
