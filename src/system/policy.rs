//! The model leaves two choices open that change the equilibrium you get: how
//! the wage bill enters the profit equation, and what the wage basket is made
//! of. Both live here as policies so a run can pick one explicitly instead of
//! inheriting whatever the pipeline happens to hardcode.

use crate::{
    algebra::{Equation, Expr, Matrix, Unknown, Value, equate, vector},
    error::{Error, Result},
};
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};

/// Builds the price equations for the profit stage.
pub trait ProfitEquationPolicy {
    /// Build the equations relating `prices` (a column vector with the
    /// numeraire already fixed) to the profit rate.
    fn equations(&self, technology: &Matrix, prices: &Matrix, labor: &Matrix, wage_rate: &Expr, profit_rate: &Expr) -> Result<Vec<Equation>>;
}

/// Builds the wage basket for the wage stage.
pub trait WageBasketPolicy {
    /// Return a column vector of length `sectors` whose only free symbol is
    /// `unknown`.
    fn basket(&self, sectors: usize, unknown: &Unknown) -> Result<Matrix>;
}

/// Where the `(1+ρ)` markup applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfitForm {
    /// Wages are advanced along with the means of production and earn the
    /// markup: `p = (1+ρ)(Ap + ωl)`.
    #[default]
    WagesAdvanced,
    /// Wages are paid at the end of the period: `p = (1+ρ)Ap + ωl`.
    WagesPostFactum,
}

impl ProfitEquationPolicy for ProfitForm {
    fn equations(&self, technology: &Matrix, prices: &Matrix, labor: &Matrix, wage_rate: &Expr, profit_rate: &Expr) -> Result<Vec<Equation>> {
        let markup = Expr::constant(Value::one()) + profit_rate.clone();
        let inputs = technology.mul(prices)?;
        let wage_bill = labor.scale(wage_rate);
        let rhs = match self {
            Self::WagesAdvanced => inputs.add(&wage_bill)?.scale(&markup),
            Self::WagesPostFactum => inputs.scale(&markup).add(&wage_bill)?,
        };
        equate(prices, &rhs)
    }
}

/// How the single wage unknown is spread over goods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WageBasket {
    /// The same amount of each active good (1-based sector numbers), nothing
    /// of the others. `None` means every sector is active.
    Equal {
        #[serde(default)]
        active: Option<Vec<usize>>,
    },
    /// Goods in fixed proportions to each other.
    Proportional {
        weights: Vec<Decimal>,
    },
}

impl Default for WageBasket {
    fn default() -> Self {
        Self::Equal { active: None }
    }
}

impl WageBasketPolicy for WageBasket {
    fn basket(&self, sectors: usize, unknown: &Unknown) -> Result<Matrix> {
        let free = unknown.expr();
        let entries = match self {
            Self::Equal { active: None } => vec![free; sectors],
            Self::Equal { active: Some(active) } => {
                if active.is_empty() {
                    Err(Error::Config("wage basket needs at least one active sector".into()))?;
                }
                if let Some(bad) = active.iter().find(|s| **s == 0 || **s > sectors) {
                    Err(Error::Config(format!("wage basket sector {} is not between 1 and {}", bad, sectors)))?;
                }
                (1..=sectors)
                    .map(|s| if active.contains(&s) { free.clone() } else { Expr::zero() })
                    .collect()
            }
            Self::Proportional { weights } => {
                if weights.len() != sectors {
                    Err(Error::Config(format!("wage basket has {} weights for {} sectors", weights.len(), sectors)))?;
                }
                if weights.iter().any(|w| w.is_sign_negative() && !w.is_zero()) || weights.iter().all(|w| w.is_zero()) {
                    Err(Error::Config("wage basket weights must be non-negative and not all zero".into()))?;
                }
                weights.iter()
                    .map(|w| Expr::constant(*w) * free.clone())
                    .collect()
            }
        };
        Ok(vector(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::value_vector;
    use rust_decimal_macros::dec;

    #[test]
    fn profit_forms() {
        let technology = Matrix::from_values(vec![vec![num!(0.3), num!(0.2)], vec![num!(0.2), num!(0.4)]]).unwrap();
        let labor = value_vector(vec![num!(1), num!(0.5)]);
        let prices = value_vector(vec![num!(2), num!(1)]);
        let wage_rate = Expr::constant(num!(0.5));
        let profit_rate = Expr::constant(num!(0.1));

        // Ap = (0.8, 0.8), ωl = (0.5, 0.25)
        let advanced = ProfitForm::WagesAdvanced.equations(&technology, &prices, &labor, &wage_rate, &profit_rate).unwrap();
        assert_eq!(advanced.len(), 2);
        assert_eq!(advanced[0].rhs().as_value(), Some(num!(1.43)));
        assert_eq!(advanced[1].rhs().as_value(), Some(num!(1.155)));

        let post = ProfitForm::WagesPostFactum.equations(&technology, &prices, &labor, &wage_rate, &profit_rate).unwrap();
        assert_eq!(post[0].rhs().as_value(), Some(num!(1.38)));
        assert_eq!(post[1].rhs().as_value(), Some(num!(1.13)));
    }

    #[test]
    fn profit_form_rejects_bad_shapes() {
        let technology = Matrix::identity(2);
        let res = ProfitForm::default().equations(
            &technology,
            &value_vector(vec![num!(1); 3]),
            &value_vector(vec![num!(1); 2]),
            &Expr::constant(Value::one()),
            &Expr::symbol("rho"),
        );
        assert!(matches!(res, Err(Error::Shape(_))));
    }

    #[test]
    fn equal_baskets() {
        let w1 = Unknown::non_negative("w1");
        let basket = WageBasket::default().basket(3, &w1).unwrap();
        assert_eq!(basket.entries(), &[w1.expr(), w1.expr(), w1.expr()]);

        let basket = WageBasket::Equal { active: Some(vec![2]) }.basket(3, &w1).unwrap();
        assert_eq!(basket.entries(), &[Expr::zero(), w1.expr(), Expr::zero()]);

        assert!(matches!(WageBasket::Equal { active: Some(vec![]) }.basket(3, &w1), Err(Error::Config(_))));
        assert!(matches!(WageBasket::Equal { active: Some(vec![4]) }.basket(3, &w1), Err(Error::Config(_))));
        assert!(matches!(WageBasket::Equal { active: Some(vec![0]) }.basket(3, &w1), Err(Error::Config(_))));
    }

    #[test]
    fn proportional_baskets() {
        let w1 = Unknown::non_negative("w1");
        let basket = WageBasket::Proportional { weights: vec![dec!(2), dec!(0.5)] }.basket(2, &w1).unwrap();
        let vals = basket.subs(&w1, &Value::integer(2)).values().unwrap();
        assert_eq!(vals, vec![num!(4), num!(1)]);

        let res = WageBasket::Proportional { weights: vec![dec!(1)] }.basket(2, &w1);
        assert!(matches!(res, Err(Error::Config(_))));
        let res = WageBasket::Proportional { weights: vec![dec!(0), dec!(0)] }.basket(2, &w1);
        assert!(matches!(res, Err(Error::Config(_))));
        let res = WageBasket::Proportional { weights: vec![dec!(-1), dec!(2)] }.basket(2, &w1);
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn deserializes() {
        let basket: WageBasket = toml::from_str(r#"kind = "proportional"
weights = [1.0, 2.0]"#).unwrap();
        assert_eq!(basket, WageBasket::Proportional { weights: vec![dec!(1), dec!(2)] });
        let basket: WageBasket = toml::from_str(r#"kind = "equal""#).unwrap();
        assert_eq!(basket, WageBasket::default());
    }
}
