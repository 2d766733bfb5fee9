//! Run configuration: the economy, the wage rates to evaluate it at and the
//! solving options, loaded from TOML.
//!
//! ```toml
//! wage-rates = [0.6909, 0.5, 0.4]
//! precision = 3
//!
//! [economy]
//! technology = [[0.3, 0.2], [0.2, 0.4]]
//! labor = [1, 0.5]
//! population = 100
//!
//! [options]
//! profit-form = "wages-advanced"
//! ```

use crate::{
    algebra::Value,
    error::{Error, Result},
    models::Economy,
    system::SolveOptions,
};
use getset::{Getters, Setters};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Serialize, Deserialize};
use std::{fs, path::Path};

/// The raw numbers describing an economy, before validation.
#[derive(Clone, Debug, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct EconomySpec {
    technology: Vec<Vec<Decimal>>,
    labor: Vec<Decimal>,
    population: Decimal,
}

/// Everything a run needs.
#[derive(Clone, Debug, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    economy: EconomySpec,
    #[serde(default)]
    #[getset(get = "pub", set = "pub")]
    wage_rates: Vec<Decimal>,
    #[serde(default = "default_precision")]
    #[getset(get = "pub", set = "pub")]
    precision: u32,
    #[serde(default)]
    #[getset(get = "pub", set = "pub")]
    options: SolveOptions,
}

fn default_precision() -> u32 {
    3
}

impl Default for RunConfig {
    /// The two-sector reference economy.
    fn default() -> Self {
        Self {
            economy: EconomySpec {
                technology: vec![vec![dec!(0.3), dec!(0.2)], vec![dec!(0.2), dec!(0.4)]],
                labor: vec![dec!(1), dec!(0.5)],
                population: dec!(100),
            },
            wage_rates: vec![dec!(0.6909), dec!(0.5), dec!(0.4)],
            precision: default_precision(),
            options: SolveOptions::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("could not read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn economy_spec(&self) -> &EconomySpec {
        &self.economy
    }

    /// Validate the configured economy.
    pub fn economy(&self) -> Result<Economy> {
        Economy::from_decimals(&self.economy.technology, &self.economy.labor, self.economy.population)
    }

    /// The wage rates as exact values.
    pub fn rates(&self) -> Vec<Value> {
        self.wage_rates.iter().map(|r| Value::from(*r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{ProfitForm, WageBasket};

    #[test]
    fn default_is_reference_economy() {
        let config = RunConfig::default();
        assert_eq!(config.precision(), &3);
        assert_eq!(config.economy_spec().population(), &dec!(100));
        assert_eq!(config.rates(), vec![num!(0.6909), num!(0.5), num!(0.4)]);
        let economy = config.economy().unwrap();
        assert_eq!(economy.sectors(), 2);
        assert_eq!(economy.productivity().unwrap(), num!(0.38));
    }

    #[test]
    fn loads_demo() {
        let config = RunConfig::from_toml_str(include_str!("../demos/three_sector.toml")).unwrap();
        assert_eq!(config.rates(), vec![num!(0.3), num!(0.5)]);
        assert_eq!(config.precision(), &4);
        assert_eq!(config.options().profit_form(), &ProfitForm::WagesAdvanced);
        assert_eq!(config.options().basket(), &WageBasket::default());
        let economy = config.economy().unwrap();
        assert_eq!(economy.sectors(), 3);
        assert_eq!(economy.labor().values().unwrap(), vec![num!(1), num!(0.8), num!(0.5)]);
    }

    #[test]
    fn defaults_and_errors() {
        let config = RunConfig::from_toml_str(r#"
[economy]
technology = [[0.5]]
labor = [2]
population = 10
"#).unwrap();
        assert_eq!(config.precision(), &3);
        assert!(config.wage_rates().is_empty());
        assert_eq!(config.options(), &SolveOptions::default());

        assert!(matches!(RunConfig::from_toml_str("precision = 2"), Err(Error::Config(_))));
        assert!(matches!(RunConfig::load("/nonexistent/sraffa.toml"), Err(Error::Config(_))));

        let config = RunConfig::from_toml_str(r#"
[economy]
technology = [[0.5, 0.9], [0.9, 0.5]]
labor = [1, 1]
population = 10
"#).unwrap();
        assert!(matches!(config.economy(), Err(Error::NonProductiveEconomy { .. })));
    }
}
