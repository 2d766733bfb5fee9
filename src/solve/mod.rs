//! A uniform calling convention over an equation-solving capability.
//!
//! Solvers are free to hand back their answers in whatever shape is natural
//! for them: a bare value when one unknown was asked for, a tuple, a mapping
//! keyed by unknown name, or a list of any of those. `solve_system` collapses
//! all of these into one ordered tuple per solution, lined up with the
//! unknowns the caller asked for, and `exactly_one` pulls out the single
//! solution a well-posed model should have.

use crate::{
    algebra::{Equation, Unknown, Value},
    error::{Error, Result, SolutionCount},
};
use std::collections::BTreeMap;

pub mod elimination;
pub(crate) mod roots;

pub use elimination::EliminationSolver;

/// One solution, with one value per requested unknown in request order.
pub type Solution = Vec<Value>;

/// The shapes a solver may return.
#[derive(Clone, Debug, PartialEq)]
pub enum RawSolution {
    /// A single bare value. Only valid when one unknown was requested.
    Scalar(Value),
    /// Values in the order the unknowns were requested.
    Tuple(Vec<Value>),
    /// Values keyed by unknown name.
    Mapping(BTreeMap<String, Value>),
    /// Zero or more solutions, each in one of the shapes above.
    List(Vec<RawSolution>),
}

/// Anything that can solve a (small, polynomial) system of equations over a
/// set of named unknowns.
pub trait Solver {
    fn solve(&self, equations: &[Equation], unknowns: &[Unknown]) -> Result<RawSolution>;
}

impl<S: Solver + ?Sized> Solver for &S {
    fn solve(&self, equations: &[Equation], unknowns: &[Unknown]) -> Result<RawSolution> {
        (**self).solve(equations, unknowns)
    }
}

/// Run the solver once and normalize whatever it returns into an ordered list
/// of solution tuples.
pub fn solve_system<S: Solver + ?Sized>(solver: &S, equations: &[Equation], unknowns: &[Unknown]) -> Result<Vec<Solution>> {
    let raw = solver.solve(equations, unknowns)?;
    normalize(raw, unknowns)
}

/// Collapse a raw solver answer into canonical tuples.
pub fn normalize(raw: RawSolution, unknowns: &[Unknown]) -> Result<Vec<Solution>> {
    let candidates = match raw {
        RawSolution::List(list) => list,
        single => vec![single],
    };
    candidates.into_iter()
        .map(|candidate| normalize_one(candidate, unknowns))
        .collect()
}

fn normalize_one(raw: RawSolution, unknowns: &[Unknown]) -> Result<Solution> {
    match raw {
        RawSolution::Scalar(val) => {
            if unknowns.len() != 1 {
                Err(Error::Normalization(format!("bare value returned for {} unknowns", unknowns.len())))?;
            }
            Ok(vec![val])
        }
        RawSolution::Tuple(vals) => {
            if vals.len() != unknowns.len() {
                Err(Error::Normalization(format!("tuple of {} values returned for {} unknowns", vals.len(), unknowns.len())))?;
            }
            Ok(vals)
        }
        RawSolution::Mapping(mut map) => {
            let solution = unknowns.iter()
                .map(|unknown| {
                    map.remove(unknown.name())
                        .ok_or_else(|| Error::Normalization(format!("no value for unknown `{}`", unknown.name())))
                })
                .collect::<Result<Vec<_>>>()?;
            if let Some(extra) = map.keys().next() {
                Err(Error::Normalization(format!("value for unrequested unknown `{}`", extra)))?;
            }
            Ok(solution)
        }
        RawSolution::List(_) => Err(Error::Normalization("nested solution list".into())),
    }
}

/// Return the only element of `solutions`, failing if there are zero or
/// several.
pub fn exactly_one<T>(solutions: Vec<T>) -> Result<T> {
    let found = solutions.len();
    let mut iter = solutions.into_iter();
    match (iter.next(), found) {
        (Some(solution), 1) => Ok(solution),
        _ => Err(Error::AmbiguousSolution { found: SolutionCount::Finite(found) }),
    }
}
