//! The economy is the fixed part of a run: the technology matrix, the labor
//! each sector needs per unit of output, and the population. The wage rate
//! varies between runs and is not part of the economy.
//!
//! An `Economy` can only be built through `Economy::new()` (or
//! `Economy::from_decimals()`), which rejects unusable inputs up front. Most
//! importantly it rejects technology matrices that are not productive, so
//! that the pipeline never has to find that out from the solver.

use crate::{
    algebra::{Matrix, Value, value_vector},
    error::{Error, Result},
};
use getset::Getters;
use rust_decimal::Decimal;

/// A linear multi-sector production economy.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Economy {
    /// The technology (input-output) matrix `A`. `A[i][j]` is how much of good
    /// `j` goes into producing one unit of good `i`.
    technology: Matrix,
    /// The labor requirement vector `l`, as a column vector.
    labor: Matrix,
    /// The population `κ`.
    population: Value,
}

impl Economy {
    /// Validate and build an economy.
    pub fn new(technology: Vec<Vec<Value>>, labor: Vec<Value>, population: Value) -> Result<Self> {
        let sectors = labor.len();
        if sectors == 0 {
            Err(Error::InvalidEconomy("an economy needs at least one sector".into()))?;
        }
        if technology.len() != sectors || technology.iter().any(|row| row.len() != sectors) {
            Err(Error::InvalidEconomy(format!("technology matrix must be {}x{} to match the labor vector", sectors, sectors)))?;
        }
        for (i, row) in technology.iter().enumerate() {
            for (j, coefficient) in row.iter().enumerate() {
                if coefficient.is_negative() || coefficient >= &Value::one() {
                    Err(Error::InvalidEconomy(format!("technology coefficient a{}{} = {} is outside [0, 1)", i + 1, j + 1, coefficient)))?;
                }
            }
        }
        for (i, requirement) in labor.iter().enumerate() {
            if requirement.is_negative() || requirement.is_zero() {
                Err(Error::InvalidEconomy(format!("labor requirement l{} = {} must be positive", i + 1, requirement)))?;
            }
        }
        if population.is_negative() || population.is_zero() {
            Err(Error::InvalidEconomy(format!("population {} must be positive", population)))?;
        }

        let economy = Self {
            technology: Matrix::from_values(technology)?,
            labor: value_vector(labor),
            population,
        };
        let determinant = economy.productivity()?;
        if determinant.is_negative() {
            Err(Error::NonProductiveEconomy { determinant: determinant.to_string() })?;
        }
        Ok(economy)
    }

    /// Build an economy from decimal inputs, which are converted to exact
    /// rationals.
    pub fn from_decimals(technology: &[Vec<Decimal>], labor: &[Decimal], population: Decimal) -> Result<Self> {
        Self::new(
            technology.iter()
                .map(|row| row.iter().map(|x| Value::from(*x)).collect())
                .collect(),
            labor.iter().map(|x| Value::from(*x)).collect(),
            Value::from(population),
        )
    }

    /// Number of sectors (goods) in the economy.
    pub fn sectors(&self) -> usize {
        self.labor.shape().0
    }

    /// `det(I - A)`. Non-negative for any economy that made it through `new()`.
    pub fn productivity(&self) -> Result<Value> {
        let det = Matrix::identity(self.sectors())
            .sub(&self.technology)?
            .determinant()?;
        det.as_value().ok_or_else(|| Error::NonConstant(det.to_string()))
    }
}
