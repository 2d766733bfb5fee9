//! The main error enum for the crate lives here, and documents the various
//! conditions that can arise while building and solving an economy.

use crate::system::equilibrium::Stage;
use std::fmt;
use thiserror::Error;

/// How many solutions a solver produced when exactly one was expected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SolutionCount {
    /// A finite number of candidate solutions (zero, two, three...)
    Finite(usize),
    /// The system left at least one unknown free
    Infinite,
}

impl fmt::Display for SolutionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionCount::Finite(n) => write!(f, "{}", n),
            SolutionCount::Infinite => write!(f, "infinitely many"),
        }
    }
}

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    /// Zero or several solutions where the model demands exactly one
    #[error("expected exactly one solution, found {found}")]
    AmbiguousSolution { found: SolutionCount },
    /// A derive_builder call failed
    #[error("error building object: {0}")]
    BuilderFailed(String),
    /// A run configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
    /// A vector being inverted element-wise has a zero entry
    #[error("division by zero at entry ({row}, {col})")]
    Division { row: usize, col: usize },
    /// The economy's inputs are out of range (negative coefficients, zero labor,
    /// mismatched dimensions, etc)
    #[error("invalid economy: {0}")]
    InvalidEconomy(String),
    /// A numeric value was required but the expression still holds unknowns
    #[error("expected a numeric value, found `{0}`")]
    NonConstant(String),
    /// The technology matrix fails the productivity precondition
    #[error("technology matrix is not productive: det(I - A) = {determinant}")]
    NonProductiveEconomy { determinant: String },
    /// The solver returned something we can't line up with the requested
    /// unknowns
    #[error("cannot normalize solver output: {0}")]
    Normalization(String),
    /// Two operands (or one operand and an operation) disagree on dimensions
    #[error("shape mismatch: {0}")]
    Shape(String),
    /// Wraps an error with the pipeline stage and wage rate it happened in
    #[error("{stage} stage failed at wage rate {wage_rate}: {source}")]
    Stage {
        stage: Stage,
        wage_rate: String,
        #[source]
        source: Box<Error>,
    },
    /// The solver can't handle the shape of the given system
    #[error("unsupported equation system: {0}")]
    Unsupported(String),
}

impl Error {
    /// Attach pipeline context to an error. Errors that already carry context
    /// are left alone.
    pub fn in_stage<T: fmt::Display>(self, stage: Stage, wage_rate: T) -> Self {
        match self {
            Error::Stage { .. } => self,
            _ => Error::Stage {
                stage,
                wage_rate: wage_rate.to_string(),
                source: Box::new(self),
            },
        }
    }

    /// Whether this error indicates a model-construction bug (as opposed to a
    /// condition some configurations legitimately run into). Fatal errors
    /// should stop a whole batch of runs, the others only the current one.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Shape(_) |
                Error::Division { .. } |
                Error::NonConstant(_) |
                Error::Normalization(_) |
                Error::BuilderFailed(_) => true,
            Error::Stage { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// Strip any stage context and return the underlying error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            _ => self,
        }
    }
}

/// Wraps `std::result::Result` around our `Error` object
pub type Result<T> = std::result::Result<T, Error>;
