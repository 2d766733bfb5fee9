//! The small algebra layer the equilibrium pipeline is built on: numeric
//! values, unknowns, polynomial expressions, equations and matrices.

pub mod expr;
pub mod linalg;
pub mod value;

pub use expr::{Domain, Equation, Expr, Unknown};
pub use linalg::{Matrix, dot, equate, hadamard, hadamard_inverse, sum_vector, value_vector, vector, vector_to_tuple};
pub use value::Value;
