//! Numeric values that flow through the algebra. A value is either an exact
//! rational (what you get from decimal inputs and linear elimination over
//! them) or a float (what you get as soon as an irrational root shows up).
//! Mixing the two always yields a float, never the other way around.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};

/// Floats with a magnitude at or below this are treated as zero when pivoting
/// or checking consistency.
pub const EPSILON: f64 = 1e-9;

/// A numeric value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Exact(BigRational),
    Float(f64),
}

impl Value {
    pub fn zero() -> Self {
        Value::Exact(BigRational::zero())
    }

    pub fn one() -> Self {
        Value::Exact(BigRational::one())
    }

    /// Create an exact integer value.
    pub fn integer(val: i64) -> Self {
        Value::Exact(BigRational::from_integer(BigInt::from(val)))
    }

    /// Create an exact `numer/denom` value. Returns `None` if `denom` is zero.
    pub fn ratio(numer: i64, denom: i64) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        Some(Value::Exact(BigRational::new(BigInt::from(numer), BigInt::from(denom))))
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Value::Exact(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Value::Exact(r) => r.is_zero(),
            Value::Float(x) => *x == 0.0,
        }
    }

    /// Zero for exact values, within `EPSILON` of zero for floats.
    pub fn is_negligible(&self) -> bool {
        match self {
            Value::Exact(r) => r.is_zero(),
            Value::Float(x) => x.abs() <= EPSILON,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Value::Exact(r) => r.is_negative(),
            Value::Float(x) => *x < 0.0,
        }
    }

    /// Lossy conversion, used for magnitudes and numeric root finding.
    pub fn to_f64(&self) -> f64 {
        match self {
            Value::Exact(r) => r.to_f64().unwrap_or(f64::NAN),
            Value::Float(x) => *x,
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Value::Exact(r) => Value::Exact(r.abs()),
            Value::Float(x) => Value::Float(x.abs()),
        }
    }

    pub fn pow(&self, exp: u32) -> Self {
        (0..exp).fold(Value::one(), |acc, _| acc * self)
    }

    /// Divide, returning `None` on a zero divisor.
    pub fn checked_div(&self, rhs: &Value) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(match (self, rhs) {
            (Value::Exact(a), Value::Exact(b)) => Value::Exact(a / b),
            _ => Value::Float(self.to_f64() / rhs.to_f64()),
        })
    }

    pub fn recip(&self) -> Option<Self> {
        Value::one().checked_div(self)
    }

    /// Compare two values within an absolute tolerance. Exact values compare
    /// exactly regardless of `tol`.
    pub fn approx_eq(&self, other: &Value, tol: f64) -> bool {
        match (self, other) {
            (Value::Exact(a), Value::Exact(b)) => a == b,
            _ => (self.to_f64() - other.to_f64()).abs() <= tol,
        }
    }

    /// If this is an exact value whose denominator only has the factors 2 and 5
    /// (and it fits), convert it into a `Decimal` without loss.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Exact(r) => exact_to_decimal(r),
            Value::Float(_) => None,
        }
    }

    fn combine<E, F>(&self, rhs: &Value, exact: E, float: F) -> Value
        where E: Fn(&BigRational, &BigRational) -> BigRational,
              F: Fn(f64, f64) -> f64,
    {
        match (self, rhs) {
            (Value::Exact(a), Value::Exact(b)) => Value::Exact(exact(a, b)),
            _ => Value::Float(float(self.to_f64(), rhs.to_f64())),
        }
    }
}

fn exact_to_decimal(val: &BigRational) -> Option<Decimal> {
    let two = BigInt::from(2);
    let five = BigInt::from(5);
    let mut rest = val.denom().clone();
    let mut twos = 0u32;
    let mut fives = 0u32;
    while (&rest % &two).is_zero() {
        rest = rest / &two;
        twos += 1;
    }
    while (&rest % &five).is_zero() {
        rest = rest / &five;
        fives += 1;
    }
    if !rest.is_one() {
        return None;
    }
    let scale = twos.max(fives);
    if scale > 28 {
        return None;
    }
    let factor = num_traits::pow(BigInt::from(10), scale as usize) / val.denom();
    let mantissa = (val.numer() * factor).to_i128()?;
    Decimal::try_from_i128_with_scale(mantissa, scale).ok()
}

impl Default for Value {
    fn default() -> Self {
        Value::zero()
    }
}

impl From<Decimal> for Value {
    fn from(dec: Decimal) -> Self {
        let numer = BigInt::from(dec.mantissa());
        let denom = num_traits::pow(BigInt::from(10), dec.scale() as usize);
        Value::Exact(BigRational::new(numer, denom))
    }
}

impl From<BigRational> for Value {
    fn from(val: BigRational) -> Self {
        Value::Exact(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::integer(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::Float(val)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Exact(r) => match exact_to_decimal(r) {
                Some(dec) => write!(f, "{}", dec),
                None => write!(f, "{}", r),
            },
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Exact(a), Value::Exact(b)) => a.partial_cmp(b),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Exact(_) => serializer.serialize_str(&self.to_string()),
            Value::Float(x) => serializer.serialize_f64(*x),
        }
    }
}

impl<'a> Add<&'a Value> for &'a Value {
    type Output = Value;

    fn add(self, rhs: &'a Value) -> Value {
        self.combine(rhs, |a, b| a + b, |a, b| a + b)
    }
}

impl<'a> Sub<&'a Value> for &'a Value {
    type Output = Value;

    fn sub(self, rhs: &'a Value) -> Value {
        self.combine(rhs, |a, b| a - b, |a, b| a - b)
    }
}

impl<'a> Mul<&'a Value> for &'a Value {
    type Output = Value;

    fn mul(self, rhs: &'a Value) -> Value {
        self.combine(rhs, |a, b| a * b, |a, b| a * b)
    }
}

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        &self + &rhs
    }
}

impl Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Value) -> Value {
        &self - &rhs
    }
}

impl Mul for Value {
    type Output = Value;

    fn mul(self, rhs: Value) -> Value {
        &self * &rhs
    }
}

impl<'a> Mul<&'a Value> for Value {
    type Output = Value;

    fn mul(self, rhs: &'a Value) -> Value {
        &self * rhs
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        match self {
            Value::Exact(r) => Value::Exact(-r),
            Value::Float(x) => Value::Float(-x),
        }
    }
}

impl<'a> Neg for &'a Value {
    type Output = Value;

    fn neg(self) -> Value {
        -self.clone()
    }
}

impl Sum for Value {
    fn sum<I: Iterator<Item = Value>>(iter: I) -> Value {
        iter.fold(Value::zero(), |acc, x| acc + x)
    }
}
