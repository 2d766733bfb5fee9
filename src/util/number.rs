//! A set of utilities for working with numbers.

/// Create an exact `Value` from a decimal literal.
///
/// This is mostly a wrapper around `rust_decimal_macros::dec!` that gives us
/// exact rationals without spelling out numerators and denominators, and can
/// also be used by callers of the crate to create numbers more seamlessly.
#[macro_export]
macro_rules! num {
    ($val:expr) => {
        $crate::algebra::Value::from(rust_decimal_macros::dec!($val))
    }
}
