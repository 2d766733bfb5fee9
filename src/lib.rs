//! Welcome to the sraffa core, a library for computing the equilibrium of a
//! linear multi-sector production economy.
//!
//! Given a technology matrix, the labor each sector needs per unit of output,
//! a population and a wage rate, the crate works out equilibrium prices, the
//! uniform profit rate, what the wage basket is made of and how the workforce
//! is spread across sectors. It does this in three stages, each one a small
//! system of equations solved symbolically and fed into the next. See the
//! [equilibrium module][1] for the details.
//!
//! The pieces:
//!
//! - [algebra][2] has exact/float values, polynomial expressions and the
//!   little bit of matrix algebra the model needs.
//! - [solve][3] defines the `Solver` capability, normalizes whatever shape a
//!   solver answers in, and ships an elimination-based solver.
//! - [models][4] holds the economy and the equilibrium state.
//! - [system][5] runs the pipeline and holds the swappable policies.
//!
//! [1]: system/equilibrium/index.html
//! [2]: algebra/index.html
//! [3]: solve/index.html
//! [4]: models/index.html
//! [5]: system/index.html

#[macro_use]
pub mod util;
pub mod algebra;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod solve;
pub mod system;
