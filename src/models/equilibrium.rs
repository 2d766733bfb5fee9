//! An equilibrium state is everything the pipeline knows about the economy at
//! one wage rate: prices, the profit rate, the wage basket and the labor
//! allocation.
//!
//! States are reported even when they are economically meaningless (a
//! negative profit rate, say). Callers can check `is_feasible()` or look at
//! `degeneracies()` to find out why a state shouldn't be taken at face value.

use crate::{
    algebra::Value,
    error::{Error, Result},
};
use getset::Getters;
use serde::Serialize;
use std::fmt;

/// A reason an equilibrium state is not economically meaningful.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Degeneracy {
    NegativeProfitRate { value: Value },
    /// The pipeline declares prices non-negative, so a solver that honors
    /// domains drops negative price roots and the profit stage fails instead.
    /// This only shows up on states built directly or by solvers that ignore
    /// domains.
    NegativePrice { sector: usize, value: Value },
    NegativeWage { sector: usize, value: Value },
    NegativeAssignment { sector: usize, value: Value },
    NegativeUnassigned { value: Value },
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // sectors are stored zero-based but named one-based, like the unknowns
        match self {
            Self::NegativeProfitRate { .. } => write!(f, "rho < 0"),
            Self::NegativePrice { sector, .. } => write!(f, "p{} < 0", sector + 1),
            Self::NegativeWage { sector, .. } => write!(f, "w{} < 0", sector + 1),
            Self::NegativeAssignment { sector, .. } => write!(f, "k{} < 0", sector + 1),
            Self::NegativeUnassigned { .. } => write!(f, "k0 < 0"),
        }
    }
}

/// The outcome of running all three stages at a single wage rate.
#[derive(Clone, Debug, PartialEq, Getters, derive_builder::Builder, Serialize)]
#[builder(pattern = "owned", setter(into))]
#[getset(get = "pub")]
pub struct EquilibriumState {
    /// The wage rate `ω` this state was solved for.
    wage_rate: Value,
    /// Normalized prices, numeraire included.
    prices: Vec<Value>,
    /// The uniform profit rate `ρ`.
    profit_rate: Value,
    /// The wage basket `w`, per worker.
    wages: Vec<Value>,
    /// Workers assigned to each sector, `k`.
    assignments: Vec<Value>,
    /// Workers not assigned to any sector, `k0 = κ - Σk`.
    unassigned: Value,
}

impl EquilibriumState {
    pub fn builder() -> EquilibriumStateBuilder {
        EquilibriumStateBuilder::default()
    }

    /// Build a state from its parts.
    pub fn new(wage_rate: Value, prices: Vec<Value>, profit_rate: Value, wages: Vec<Value>, assignments: Vec<Value>, unassigned: Value) -> Result<Self> {
        Self::builder()
            .wage_rate(wage_rate)
            .prices(prices)
            .profit_rate(profit_rate)
            .wages(wages)
            .assignments(assignments)
            .unassigned(unassigned)
            .build()
            .map_err(|e| Error::BuilderFailed(e))
    }

    /// Every way in which this state is degenerate, in a stable order. Floats
    /// within `EPSILON` of zero count as zero.
    pub fn degeneracies(&self) -> Vec<Degeneracy> {
        fn sectoral<F>(vals: &[Value], make: F) -> impl Iterator<Item = Degeneracy> + '_
            where F: Fn(usize, Value) -> Degeneracy + 'static
        {
            vals.iter()
                .enumerate()
                .filter(|(_, v)| below_zero(v))
                .map(move |(i, v)| make(i, v.clone()))
        }

        let mut found = Vec::new();
        if below_zero(&self.profit_rate) {
            found.push(Degeneracy::NegativeProfitRate { value: self.profit_rate.clone() });
        }
        found.extend(sectoral(&self.prices, |sector, value| Degeneracy::NegativePrice { sector, value }));
        found.extend(sectoral(&self.wages, |sector, value| Degeneracy::NegativeWage { sector, value }));
        found.extend(sectoral(&self.assignments, |sector, value| Degeneracy::NegativeAssignment { sector, value }));
        if below_zero(&self.unassigned) {
            found.push(Degeneracy::NegativeUnassigned { value: self.unassigned.clone() });
        }
        found
    }

    /// Whether the state has no degeneracies.
    pub fn is_feasible(&self) -> bool {
        self.degeneracies().is_empty()
    }
}

fn below_zero(val: &Value) -> bool {
    val.is_negative() && !val.is_negligible()
}
