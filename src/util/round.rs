//! Rounding for display. Rounding never changes the kind of a value: exact
//! values come back exact and floats come back as floats.

use crate::algebra::{Expr, Value};
use num_bigint::BigInt;
use num_rational::BigRational;
use rust_decimal::{Decimal, RoundingStrategy, prelude::*};

/// Round a value to `places` decimal places, half away from zero.
pub fn round_for_display(val: &Value, places: u32) -> Value {
    match val {
        Value::Exact(r) => {
            let scale = BigRational::from_integer(BigInt::from(10u32).pow(places));
            Value::Exact((r * &scale).round() / scale)
        }
        Value::Float(x) => {
            // the float's exact binary value: 2.675 is stored as 2.67499..
            let rounded = Decimal::from_f64_retain(*x)
                .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
                .and_then(|d| d.to_f64());
            // NaN, infinities and anything too big for a Decimal pass through
            Value::Float(rounded.unwrap_or(*x))
        }
    }
}

/// Round an expression if it's numeric, otherwise hand it back untouched.
pub fn round_expr_for_display(expr: &Expr, places: u32) -> Expr {
    match expr.as_value() {
        Some(val) => Expr::constant(round_for_display(&val, places)),
        None => expr.clone(),
    }
}

pub fn round_tuple(vals: &[Value], places: u32) -> Vec<Value> {
    vals.iter()
        .map(|v| round_for_display(v, places))
        .collect()
}
