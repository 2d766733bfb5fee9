//! The built-in equation solver.
//!
//! Handles the two kinds of system the equilibrium pipeline produces:
//!
//! - systems linear in every unknown, solved by Gauss-Jordan elimination over
//!   `Value` (exactly, if the coefficients are exact);
//! - systems that become linear once one unknown (the "parameter") is fixed,
//!   like the profit equation which is bilinear in the profit rate and the
//!   prices. For those, the augmented matrix `[M(t) | c(t)]` must be singular
//!   at a solution, so we find the real roots of its determinant and solve the
//!   remaining linear system at each one.
//!
//! Candidate solutions outside an unknown's declared domain are dropped.

use crate::{
    algebra::{Equation, Expr, Matrix, Unknown, Value},
    error::{Error, Result, SolutionCount},
    solve::{RawSolution, Solver, roots},
};
use num_traits::Zero;
use tracing::{debug, trace};

/// Residuals of a verified float solution must be at least this small.
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// A system `M x + c = 0` whose coefficients may still hold a parameter.
struct Linearized {
    matrix: Vec<Vec<Expr>>,
    constants: Vec<Expr>,
}

/// What Gauss-Jordan elimination found.
#[derive(Debug, PartialEq)]
enum LinearOutcome {
    Unique(Vec<Value>),
    Inconsistent,
    Underdetermined(usize),
}

/// Solves small polynomial systems that are linear, or linear after fixing
/// one unknown.
#[derive(Clone, Copy, Debug, Default)]
pub struct EliminationSolver;

impl EliminationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn solve_linear(&self, system: Linearized, unknowns: &[Unknown]) -> Result<RawSolution> {
        let matrix = constant_rows(&system.matrix, None)?;
        let rhs = constant_rhs(&system.constants, None)?;
        match gauss(matrix, rhs, unknowns.len())? {
            LinearOutcome::Unique(vals) => {
                if !admissible(unknowns, &vals) {
                    debug!("unique solution lies outside the declared domains");
                    return Ok(RawSolution::List(Vec::new()));
                }
                if vals.len() == 1 {
                    return Ok(RawSolution::Scalar(vals.into_iter().next().unwrap_or_default()));
                }
                Ok(RawSolution::Mapping(
                    unknowns.iter()
                        .map(|u| u.name().clone())
                        .zip(vals)
                        .collect()
                ))
            }
            LinearOutcome::Inconsistent => Ok(RawSolution::List(Vec::new())),
            LinearOutcome::Underdetermined(free) => {
                debug!(free, "linear system is underdetermined");
                Err(Error::AmbiguousSolution { found: SolutionCount::Infinite })
            }
        }
    }

    fn solve_parametric(&self, residuals: &[Expr], unknowns: &[Unknown]) -> Result<RawSolution> {
        let names = unknowns.iter().map(|u| u.name().clone()).collect::<Vec<_>>();
        for (idx, parameter) in unknowns.iter().enumerate() {
            let rest = names.iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, n)| n.clone())
                .collect::<Vec<_>>();
            let system = match linearize(residuals, &rest, Some(parameter.name())) {
                Some(system) => system,
                None => continue,
            };
            if residuals.len() != unknowns.len() {
                Err(Error::Unsupported(format!("{} nonlinear equations for {} unknowns", residuals.len(), unknowns.len())))?;
            }
            debug!(parameter = %parameter.name(), "system is linear once the parameter is fixed");
            return self.solve_with_parameter(system, residuals, idx, unknowns);
        }
        Err(Error::Unsupported("system is nonlinear in more than one unknown".into()))
    }

    fn solve_with_parameter(&self, system: Linearized, residuals: &[Expr], idx: usize, unknowns: &[Unknown]) -> Result<RawSolution> {
        let parameter = unknowns[idx].name();
        let augmented = system.matrix.iter()
            .zip(system.constants.iter())
            .map(|(row, constant)| {
                let mut row = row.clone();
                row.push(constant.clone());
                row
            })
            .collect::<Vec<_>>();
        let det = Matrix::from_rows(augmented)?.determinant()?;
        if det.is_zero() {
            debug!(parameter = %parameter, "consistency condition vanishes identically");
            Err(Error::AmbiguousSolution { found: SolutionCount::Infinite })?;
        }
        let coefficients = det.univariate_coefficients(parameter)
            .ok_or_else(|| Error::Unsupported(format!("consistency condition is not univariate in `{}`", parameter)))?;

        let mut solutions: Vec<Vec<Value>> = Vec::new();
        for root in roots::real_roots(&coefficients) {
            let matrix = constant_rows(&system.matrix, Some((parameter, &root)))?;
            let rhs = constant_rhs(&system.constants, Some((parameter, &root)))?;
            let mut tuple = match gauss(matrix, rhs, unknowns.len() - 1)? {
                LinearOutcome::Unique(vals) => vals,
                LinearOutcome::Inconsistent => {
                    trace!(root = %root, "inconsistent at root");
                    continue;
                }
                LinearOutcome::Underdetermined(_) => Err(Error::AmbiguousSolution { found: SolutionCount::Infinite })?,
            };
            tuple.insert(idx, root);
            if !admissible(unknowns, &tuple) {
                trace!(candidate = ?tuple, "candidate lies outside the declared domains");
                continue;
            }
            if !satisfies(residuals, unknowns, &tuple) {
                trace!(candidate = ?tuple, "candidate fails verification");
                continue;
            }
            let duplicate = solutions.iter()
                .any(|s| s.iter().zip(tuple.iter()).all(|(a, b)| a.approx_eq(b, RESIDUAL_TOLERANCE)));
            if !duplicate {
                solutions.push(tuple);
            }
        }
        Ok(RawSolution::List(solutions.into_iter().map(RawSolution::Tuple).collect()))
    }
}

impl Solver for EliminationSolver {
    fn solve(&self, equations: &[Equation], unknowns: &[Unknown]) -> Result<RawSolution> {
        let names = unknowns.iter().map(|u| u.name().clone()).collect::<Vec<_>>();
        let mut residuals = Vec::with_capacity(equations.len());
        for equation in equations {
            let residual = equation.residual();
            if let Some(val) = residual.as_value() {
                if val.is_negligible() {
                    continue;
                }
                debug!(equation = %equation, "equation can never hold");
                return Ok(RawSolution::List(Vec::new()));
            }
            if let Some(stray) = residual.symbols().into_iter().find(|s| !names.contains(s)) {
                Err(Error::Unsupported(format!("equation mentions `{}`, which was not requested", stray)))?;
            }
            residuals.push(residual);
        }

        match linearize(&residuals, &names, None) {
            Some(system) => {
                debug!(equations = residuals.len(), unknowns = names.len(), "solving linear system");
                self.solve_linear(system, unknowns)
            }
            None => self.solve_parametric(&residuals, unknowns),
        }
    }
}

/// Split each residual into `M x + c`, requiring the coefficients to mention
/// nothing but the parameter (if given).
fn linearize(residuals: &[Expr], vars: &[String], parameter: Option<&str>) -> Option<Linearized> {
    let allowed = |expr: &Expr| expr.symbols().iter().all(|s| Some(s.as_str()) == parameter);
    let mut matrix = Vec::with_capacity(residuals.len());
    let mut constants = Vec::with_capacity(residuals.len());
    for residual in residuals {
        let (coefficients, rest) = residual.linear_form(vars)?;
        if !coefficients.iter().all(|c| allowed(c)) || !allowed(&rest) {
            return None;
        }
        matrix.push(coefficients);
        constants.push(rest);
    }
    Some(Linearized { matrix, constants })
}

fn constant_of(expr: &Expr, at: Option<(&str, &Value)>) -> Result<Value> {
    let expr = match at {
        Some((name, val)) => expr.subs(name, val),
        None => expr.clone(),
    };
    expr.as_value().ok_or_else(|| Error::NonConstant(expr.to_string()))
}

fn constant_rows(rows: &[Vec<Expr>], at: Option<(&str, &Value)>) -> Result<Vec<Vec<Value>>> {
    rows.iter()
        .map(|row| row.iter().map(|e| constant_of(e, at)).collect::<Result<Vec<_>>>())
        .collect()
}

/// The right-hand side `-c` of `M x = -c`.
fn constant_rhs(constants: &[Expr], at: Option<(&str, &Value)>) -> Result<Vec<Value>> {
    constants.iter()
        .map(|c| constant_of(c, at).map(|v| -v))
        .collect()
}

fn admissible(unknowns: &[Unknown], vals: &[Value]) -> bool {
    unknowns.iter().zip(vals.iter()).all(|(u, v)| u.admits(v))
}

fn satisfies(residuals: &[Expr], unknowns: &[Unknown], vals: &[Value]) -> bool {
    residuals.iter().all(|residual| {
        match residual.subs_all(unknowns.iter().zip(vals.iter())).as_value() {
            Some(Value::Exact(r)) => r.is_zero(),
            Some(Value::Float(x)) => x.abs() <= RESIDUAL_TOLERANCE,
            None => false,
        }
    })
}

/// Gauss-Jordan elimination of `rows * x = rhs` with `cols` unknowns. Pivots
/// on the largest entry in each column, which only matters for floats.
fn gauss(mut rows: Vec<Vec<Value>>, mut rhs: Vec<Value>, cols: usize) -> Result<LinearOutcome> {
    let num_rows = rows.len();
    let mut pivot_cols = Vec::with_capacity(cols);
    let mut rank = 0;
    for col in 0..cols {
        if rank == num_rows {
            break;
        }
        let pivot = (rank..num_rows)
            .filter(|r| !rows[*r][col].is_negligible())
            .max_by(|a, b| {
                rows[*a][col].to_f64().abs()
                    .partial_cmp(&rows[*b][col].to_f64().abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let pivot = match pivot {
            Some(pivot) => pivot,
            None => continue,
        };
        rows.swap(rank, pivot);
        rhs.swap(rank, pivot);

        let inv = rows[rank][col].recip().ok_or(Error::Division { row: rank, col })?;
        for c in col..cols {
            rows[rank][c] = &rows[rank][c] * &inv;
        }
        rhs[rank] = &rhs[rank] * &inv;

        for r in 0..num_rows {
            if r == rank || rows[r][col].is_zero() {
                continue;
            }
            let factor = rows[r][col].clone();
            for c in col..cols {
                let reduced = &rows[r][c] - &(&factor * &rows[rank][c]);
                rows[r][c] = reduced;
            }
            let reduced = &rhs[r] - &(&factor * &rhs[rank]);
            rhs[r] = reduced;
        }
        pivot_cols.push(col);
        rank += 1;
    }

    if rhs[rank..].iter().any(|v| !v.is_negligible()) {
        return Ok(LinearOutcome::Inconsistent);
    }
    if rank < cols {
        return Ok(LinearOutcome::Underdetermined(cols - rank));
    }
    let mut solution = vec![Value::zero(); cols];
    for (row, col) in pivot_cols.into_iter().enumerate() {
        solution[col] = rhs[row].clone();
    }
    Ok(LinearOutcome::Unique(solution))
}
