//! The system module is where economies get solved. `equilibrium` runs the
//! three-stage pipeline and `policy` holds the modeling choices the pipeline
//! lets callers swap out.

pub mod equilibrium;
pub mod policy;

pub use equilibrium::{SolveOptions, Stage, solve, solve_rates};
pub use policy::{ProfitEquationPolicy, ProfitForm, WageBasket, WageBasketPolicy};
