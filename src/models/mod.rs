//! Models hold the data the equilibrium pipeline consumes and produces. They
//! don't solve anything themselves; see the [system module][1] for that.
//!
//! [1]: ../system/index.html

pub mod economy;
pub mod equilibrium;

pub use economy::Economy;
pub use equilibrium::{Degeneracy, EquilibriumState};
