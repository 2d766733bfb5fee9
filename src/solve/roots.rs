//! Real roots of univariate polynomials.
//!
//! Roots are isolated numerically: the critical points (roots of the
//! derivative, found recursively) split the real line into monotone pieces,
//! and each piece that changes sign is bisected down to machine precision.
//! When the polynomial has exact coefficients, each float root is then
//! checked against its continued-fraction convergents so that rational roots
//! come back as exact values.

use crate::algebra::Value;
use num_bigint::BigInt;
use num_rational::BigRational;
use tracing::trace;

/// Largest denominator tried when recovering an exact root.
const MAX_DENOMINATOR: i128 = 1_000_000_000_000;

/// Drop leading coefficients that are (numerically) zero.
pub(crate) fn trim(coefficients: &[Value]) -> Vec<Value> {
    let scale = coefficients.iter().map(|c| c.to_f64().abs()).fold(0.0, f64::max);
    let mut out = coefficients.to_vec();
    while let Some(last) = out.last() {
        let negligible = match last {
            Value::Exact(_) => last.is_zero(),
            Value::Float(x) => x.abs() <= 1e-12 * scale,
        };
        if !negligible {
            break;
        }
        out.pop();
    }
    out
}

/// Evaluate a polynomial (constant term first) at `x`.
pub(crate) fn eval(coefficients: &[Value], x: &Value) -> Value {
    coefficients.iter()
        .rev()
        .fold(Value::zero(), |acc, c| acc * x + c.clone())
}

fn eval_f64(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// The size of the rounding error we can expect from evaluating at `x`.
fn eval_scale(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x.abs() + c.abs())
}

fn derivative(coefficients: &[f64]) -> Vec<f64> {
    coefficients.iter()
        .enumerate()
        .skip(1)
        .map(|(power, c)| c * power as f64)
        .collect()
}

fn bisect(coefficients: &[f64], mut lo: f64, mut hi: f64) -> f64 {
    let mut f_lo = eval_f64(coefficients, lo);
    for _ in 0..200 {
        let mid = lo + (hi - lo) / 2.0;
        if mid <= lo || mid >= hi {
            break;
        }
        let f_mid = eval_f64(coefficients, mid);
        if f_mid == 0.0 {
            return mid;
        }
        if (f_mid < 0.0) == (f_lo < 0.0) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    lo + (hi - lo) / 2.0
}

/// All real roots of a float polynomial, sorted ascending, with repeated roots
/// reported once. Leading coefficient must be nonzero.
fn float_roots(coefficients: &[f64]) -> Vec<f64> {
    let degree = coefficients.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }
    let lead = coefficients[degree];
    if degree == 1 {
        return vec![-coefficients[0] / lead];
    }
    // cauchy bound: every root lies strictly inside (-bound, bound)
    let bound = 1.0 + coefficients[..degree].iter().map(|c| (c / lead).abs()).fold(0.0, f64::max);
    let mut points = vec![-bound];
    points.extend(float_roots(&derivative(coefficients)).into_iter().filter(|x| x.abs() < bound));
    points.push(bound);

    let mut roots: Vec<f64> = Vec::new();
    for pair in points.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let f_lo = eval_f64(coefficients, lo);
        let f_hi = eval_f64(coefficients, hi);
        if f_lo.abs() <= 1e-12 * eval_scale(coefficients, lo) {
            // touches zero at a critical point (even multiplicity)
            roots.push(lo);
        } else if (f_lo < 0.0) != (f_hi < 0.0) && f_hi.abs() > 1e-12 * eval_scale(coefficients, hi) {
            roots.push(bisect(coefficients, lo, hi));
        }
    }
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    roots.dedup_by(|a, b| (*a - *b).abs() <= 1e-12 * (1.0 + a.abs()));
    roots
}

/// Continued-fraction convergents of `x` with denominators up to
/// `MAX_DENOMINATOR`.
fn convergents(x: f64) -> Vec<BigRational> {
    let mut out = Vec::new();
    let (mut h_prev, mut h) = (1i128, x.floor() as i128);
    let (mut k_prev, mut k) = (0i128, 1i128);
    let mut frac = x - x.floor();
    out.push(BigRational::new(BigInt::from(h), BigInt::from(k)));
    for _ in 0..64 {
        if frac.abs() < 1e-15 {
            break;
        }
        let inv = 1.0 / frac;
        let a = inv.floor();
        if !a.is_finite() || a > 1e15 {
            break;
        }
        let a = a as i128;
        let next_h = match a.checked_mul(h).and_then(|v| v.checked_add(h_prev)) {
            Some(v) => v,
            None => break,
        };
        let next_k = match a.checked_mul(k).and_then(|v| v.checked_add(k_prev)) {
            Some(v) => v,
            None => break,
        };
        if next_k > MAX_DENOMINATOR {
            break;
        }
        h_prev = h;
        h = next_h;
        k_prev = k;
        k = next_k;
        out.push(BigRational::new(BigInt::from(h), BigInt::from(k)));
        frac = inv - inv.floor();
    }
    out
}

/// Real roots of a polynomial given constant term first. Rational roots of
/// exact polynomials come back exact, everything else as floats.
pub(crate) fn real_roots(coefficients: &[Value]) -> Vec<Value> {
    let coefficients = trim(coefficients);
    if coefficients.len() <= 1 {
        return Vec::new();
    }
    let exact = coefficients.iter().all(|c| c.is_exact());
    let floats = coefficients.iter().map(|c| c.to_f64()).collect::<Vec<_>>();
    if exact && coefficients.len() == 2 {
        // linear: no need to go through floats at all
        if let Some(root) = (-&coefficients[0]).checked_div(&coefficients[1]) {
            return vec![root];
        }
    }
    float_roots(&floats)
        .into_iter()
        .map(|root| {
            if exact && root.is_finite() {
                let recovered = convergents(root)
                    .into_iter()
                    .map(Value::Exact)
                    .find(|candidate| eval(&coefficients, candidate).is_zero());
                if let Some(val) = recovered {
                    trace!(root = %val, "recovered exact root");
                    return val;
                }
            }
            trace!(root, "float root");
            Value::Float(root)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(coefficients: &[i64]) -> Vec<Value> {
        coefficients.iter().map(|c| Value::integer(*c)).collect()
    }

    #[test]
    fn exact_rational_roots() {
        // (2x - 1)(x + 3) = 2x^2 + 5x - 3
        let roots = real_roots(&ints(&[-3, 5, 2]));
        assert_eq!(roots, vec![Value::integer(-3), Value::ratio(1, 2).unwrap()]);
    }

    #[test]
    fn irrational_roots_are_floats() {
        // x^2 - 2
        let roots = real_roots(&ints(&[-2, 0, 1]));
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|r| !r.is_exact()));
        assert!((roots[1].to_f64() - 2f64.sqrt()).abs() < 1e-12);
        assert!((roots[0].to_f64() + 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn double_roots_reported_once() {
        // (x - 1)^2 (x + 2) = x^3 - 3x + 2
        let roots = real_roots(&ints(&[2, -3, 0, 1]));
        assert_eq!(roots, vec![Value::integer(-2), Value::integer(1)]);
    }

    #[test]
    fn no_real_roots() {
        assert!(real_roots(&ints(&[1, 0, 1])).is_empty());
        assert!(real_roots(&ints(&[4])).is_empty());
        assert!(real_roots(&ints(&[0, 0, 0])).is_empty());
    }

    #[test]
    fn linear_and_trimmed() {
        // 3x - 1 with a zero leading coefficient tacked on
        let mut coefficients = ints(&[-1, 3]);
        coefficients.push(Value::zero());
        assert_eq!(real_roots(&coefficients), vec![Value::ratio(1, 3).unwrap()]);
        let floats = vec![Value::Float(-1.0), Value::Float(4.0)];
        assert_eq!(real_roots(&floats), vec![Value::Float(0.25)]);
    }
}
