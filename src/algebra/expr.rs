//! Unknowns, polynomial expressions over them, and equations between those
//! expressions.
//!
//! Expressions are kept in expanded form: a map from monomial to coefficient.
//! That is all the pipeline needs (every equation it builds is polynomial) and
//! it makes the questions the solver asks ("is this linear in x?", "what is
//! the coefficient of y?") simple lookups.

use crate::algebra::value::Value;
use getset::Getters;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// The domain an unknown is declared over. Domains are advisory: a solver may
/// use them to discard candidate solutions, nothing else enforces them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Real,
    NonNegative,
}

/// A named placeholder for an undetermined quantity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Getters)]
#[getset(get = "pub")]
pub struct Unknown {
    name: String,
    domain: Domain,
}

impl Unknown {
    /// An unknown ranging over all reals.
    pub fn real<T: Into<String>>(name: T) -> Self {
        Self { name: name.into(), domain: Domain::Real }
    }

    /// An unknown declared non-negative.
    pub fn non_negative<T: Into<String>>(name: T) -> Self {
        Self { name: name.into(), domain: Domain::NonNegative }
    }

    /// Whether `val` lies inside this unknown's domain. Floats get `EPSILON` of
    /// slack below zero.
    pub fn admits(&self, val: &Value) -> bool {
        match self.domain {
            Domain::Real => true,
            Domain::NonNegative => !val.is_negative() || val.is_negligible(),
        }
    }

    /// This unknown as an expression.
    pub fn expr(&self) -> Expr {
        Expr::symbol(&self.name)
    }
}

/// A product of unknowns raised to positive powers, sorted by name. The empty
/// monomial is the constant term.
pub type Monomial = Vec<(String, u32)>;

fn monomial_mul(a: &Monomial, b: &Monomial) -> Monomial {
    let mut merged: BTreeMap<String, u32> = a.iter().cloned().collect();
    for (name, exp) in b {
        *merged.entry(name.clone()).or_insert(0) += exp;
    }
    merged.into_iter().collect()
}

/// A polynomial in any number of unknowns with `Value` coefficients.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expr {
    terms: BTreeMap<Monomial, Value>,
}

impl Expr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant<V: Into<Value>>(val: V) -> Self {
        let mut expr = Self::zero();
        expr.add_term(Vec::new(), val.into());
        expr
    }

    pub fn symbol<T: Into<String>>(name: T) -> Self {
        let mut expr = Self::zero();
        expr.add_term(vec![(name.into(), 1)], Value::one());
        expr
    }

    /// Accumulate a term. Exact zeros are dropped; float zeros are kept so a
    /// computed `0.0` stays a float.
    fn add_term(&mut self, monomial: Monomial, coefficient: Value) {
        let sum = match self.terms.remove(&monomial) {
            Some(existing) => existing + coefficient,
            None => coefficient,
        };
        if !(sum.is_exact() && sum.is_zero()) {
            self.terms.insert(monomial, sum);
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Value)> {
        self.terms.iter()
    }

    /// True if every coefficient is zero.
    pub fn is_zero(&self) -> bool {
        self.terms.values().all(|v| v.is_zero())
    }

    /// If this expression has no unknowns left, return its value.
    pub fn as_value(&self) -> Option<Value> {
        let mut constant = Value::zero();
        for (monomial, coefficient) in &self.terms {
            if !monomial.is_empty() {
                return None;
            }
            constant = coefficient.clone();
        }
        Some(constant)
    }

    /// Every unknown name appearing in the expression.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.terms.keys()
            .flat_map(|m| m.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// Highest power of `name` appearing in any term.
    pub fn degree_in(&self, name: &str) -> u32 {
        self.terms.keys()
            .flat_map(|m| m.iter().filter(|(n, _)| n == name).map(|(_, e)| *e))
            .max()
            .unwrap_or(0)
    }

    /// Replace `name` with `val` everywhere.
    pub fn subs(&self, name: &str, val: &Value) -> Expr {
        let mut out = Expr::zero();
        for (monomial, coefficient) in &self.terms {
            let mut coefficient = coefficient.clone();
            let mut rest = Monomial::new();
            for (n, exp) in monomial {
                if n == name {
                    coefficient = coefficient * val.pow(*exp);
                } else {
                    rest.push((n.clone(), *exp));
                }
            }
            out.add_term(rest, coefficient);
        }
        out
    }

    /// Apply a series of substitutions.
    pub fn subs_all<'a, I>(&self, assignments: I) -> Expr
        where I: IntoIterator<Item = (&'a Unknown, &'a Value)>,
    {
        assignments.into_iter()
            .fold(self.clone(), |expr, (unknown, val)| expr.subs(unknown.name(), val))
    }

    /// Split this expression into `Σ coeff_j · vars_j + rest`, where the
    /// coefficients and the rest may still hold unknowns outside `vars`.
    /// Returns `None` if any term has a product or power of the `vars`.
    pub fn linear_form(&self, vars: &[String]) -> Option<(Vec<Expr>, Expr)> {
        let mut coefficients = vec![Expr::zero(); vars.len()];
        let mut rest = Expr::zero();
        for (monomial, coefficient) in &self.terms {
            let mut hit = None;
            let mut remaining = Monomial::new();
            for (name, exp) in monomial {
                match vars.iter().position(|v| v == name) {
                    Some(idx) => {
                        if *exp != 1 || hit.is_some() {
                            return None;
                        }
                        hit = Some(idx);
                    }
                    None => remaining.push((name.clone(), *exp)),
                }
            }
            match hit {
                Some(idx) => coefficients[idx].add_term(remaining, coefficient.clone()),
                None => rest.add_term(remaining, coefficient.clone()),
            }
        }
        Some((coefficients, rest))
    }

    /// Read this expression as a univariate polynomial in `name`, returning
    /// coefficients from the constant term upwards. `None` if any other unknown
    /// appears.
    pub fn univariate_coefficients(&self, name: &str) -> Option<Vec<Value>> {
        let mut coefficients = vec![Value::zero(); self.degree_in(name) as usize + 1];
        for (monomial, coefficient) in &self.terms {
            let exp = match monomial.as_slice() {
                [] => 0,
                [(n, exp)] if n == name => *exp,
                _ => return None,
            };
            let slot = &mut coefficients[exp as usize];
            *slot = &*slot + coefficient;
        }
        Some(coefficients)
    }
}

impl From<Value> for Expr {
    fn from(val: Value) -> Self {
        Expr::constant(val)
    }
}

impl From<&Value> for Expr {
    fn from(val: &Value) -> Self {
        Expr::constant(val.clone())
    }
}

impl From<&Unknown> for Expr {
    fn from(unknown: &Unknown) -> Self {
        unknown.expr()
    }
}

impl<'a> Add<&'a Expr> for &'a Expr {
    type Output = Expr;

    fn add(self, rhs: &'a Expr) -> Expr {
        let mut out = self.clone();
        for (monomial, coefficient) in &rhs.terms {
            out.add_term(monomial.clone(), coefficient.clone());
        }
        out
    }
}

impl<'a> Sub<&'a Expr> for &'a Expr {
    type Output = Expr;

    fn sub(self, rhs: &'a Expr) -> Expr {
        self + &(-rhs)
    }
}

impl<'a> Mul<&'a Expr> for &'a Expr {
    type Output = Expr;

    fn mul(self, rhs: &'a Expr) -> Expr {
        let mut out = Expr::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                out.add_term(monomial_mul(m1, m2), c1 * c2);
            }
        }
        out
    }
}

impl<'a> Neg for &'a Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr {
            terms: self.terms.iter()
                .map(|(m, c)| (m.clone(), -c))
                .collect(),
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        &self + &rhs
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        &self - &rhs
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        &self * &rhs
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -&self
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (idx, (monomial, coefficient)) in self.terms.iter().enumerate() {
            if idx > 0 {
                write!(f, " + ")?;
            }
            let factors = monomial.iter()
                .map(|(name, exp)| if *exp == 1 { name.clone() } else { format!("{}^{}", name, exp) })
                .collect::<Vec<_>>();
            if factors.is_empty() {
                write!(f, "{}", coefficient)?;
            } else if coefficient == &Value::one() {
                write!(f, "{}", factors.join("*"))?;
            } else {
                write!(f, "{}*{}", coefficient, factors.join("*"))?;
            }
        }
        Ok(())
    }
}

/// An equality between two expressions.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Equation {
    lhs: Expr,
    rhs: Expr,
}

impl Equation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }

    /// `lhs - rhs`, which is zero wherever the equation holds.
    pub fn residual(&self) -> Expr {
        &self.lhs - &self.rhs
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn x() -> Expr { Expr::symbol("x") }
    fn y() -> Expr { Expr::symbol("y") }

    #[test]
    fn expands_and_cancels() {
        // (x + 1)(x - 1) = x^2 - 1
        let one = Expr::constant(Value::one());
        let prod = (x() + one.clone()) * (x() - one);
        assert_eq!(prod.degree_in("x"), 2);
        assert_eq!(prod.univariate_coefficients("x"), Some(vec![Value::integer(-1), Value::zero(), Value::one()]));
        assert!((x() - x()).is_zero());
        assert_eq!((x() - x()).as_value(), Some(Value::zero()));
    }

    #[test]
    fn substitutes() {
        let expr = x() * y() + Expr::constant(Value::from(dec!(0.5))) * x();
        let half = Value::from(dec!(0.5));
        let partial = expr.subs("x", &Value::integer(2));
        assert_eq!(partial.symbols().into_iter().collect::<Vec<_>>(), vec!["y".to_string()]);
        let full = partial.subs("y", &half);
        assert_eq!(full.as_value(), Some(Value::integer(2)));
        // the original is untouched
        assert_eq!(expr.symbols().len(), 2);
    }

    #[test]
    fn float_zero_stays_float() {
        let expr = Expr::constant(Value::Float(0.5)) - Expr::constant(Value::Float(0.5));
        assert_eq!(expr.as_value(), Some(Value::Float(0.0)));
        assert!(expr.is_zero());
    }

    #[test]
    fn linear_form() {
        // 2*x*t + 3*y - t + 4
        let t = Expr::symbol("t");
        let expr = Expr::constant(Value::integer(2)) * x() * t.clone()
            + Expr::constant(Value::integer(3)) * y()
            - t.clone()
            + Expr::constant(Value::integer(4));
        let vars = vec!["x".to_string(), "y".to_string()];
        let (coefficients, rest) = expr.linear_form(&vars).unwrap();
        assert_eq!(coefficients[0], Expr::constant(Value::integer(2)) * t.clone());
        assert_eq!(coefficients[1], Expr::constant(Value::integer(3)));
        assert_eq!(rest, Expr::constant(Value::integer(4)) - t);

        let bilinear = x() * y();
        assert_eq!(bilinear.linear_form(&vars), None);
        assert_eq!((x() * x()).linear_form(&vars[..1]), None);
    }

    #[test]
    fn unknown_domains() {
        let p = Unknown::non_negative("p1");
        assert!(p.admits(&Value::integer(3)));
        assert!(p.admits(&Value::Float(-1e-12)));
        assert!(!p.admits(&Value::ratio(-1, 1000).unwrap()));
        assert!(Unknown::real("rho").admits(&Value::integer(-3)));
    }

    #[test]
    fn display() {
        let expr = Expr::constant(Value::integer(2)) * x() * x() + y();
        assert_eq!(expr.to_string(), "2*x^2 + y");
        assert_eq!(Equation::new(x(), Expr::zero()).to_string(), "x = 0");
    }
}
