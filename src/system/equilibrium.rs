//! The equilibrium pipeline. Given an economy and a wage rate, we solve three
//! systems of equations in order, each one feeding its solution into the
//! next:
//!
//! 1. **Profit**: prices and the profit rate, from the configured
//!    [ProfitForm][crate::system::policy::ProfitForm]. One price (the
//!    numeraire) is fixed to 1. This is the only stage that isn't linear: the
//!    profit rate multiplies the prices.
//! 2. **Wage**: the wage basket, whose value at those prices has to equal the
//!    wage rate. The shape of the basket comes from the configured
//!    [WageBasket][crate::system::policy::WageBasket].
//! 3. **Production**: how many workers each sector needs so that the economy
//!    reproduces its inputs and feeds the population, and how many are left
//!    over.
//!
//! Each wage rate is independent of the others, so `solve_rates` just runs
//! `solve` once per rate and keeps going when one of them fails.

use crate::{
    algebra::{Equation, Expr, Unknown, Value, dot, equate, hadamard, hadamard_inverse, sum_vector, value_vector, vector},
    error::{Error, Result},
    models::{Economy, EquilibriumState},
    solve::{Solver, exactly_one, solve_system},
    system::policy::{ProfitEquationPolicy, ProfitForm, WageBasket, WageBasketPolicy},
};
use getset::{Getters, Setters};
use serde::{Serialize, Deserialize};
use std::fmt;
use tracing::{debug, warn};

/// The stages of the pipeline, used to give errors some context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Profit,
    Wage,
    Production,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Profit => "profit",
            Self::Wage => "wage",
            Self::Production => "production",
        };
        write!(f, "{}", name)
    }
}

/// The choices a run makes that the economy itself doesn't pin down.
#[derive(Clone, Debug, Default, PartialEq, Getters, Setters, derive_builder::Builder, Serialize, Deserialize)]
#[builder(pattern = "owned", setter(into), default)]
#[getset(get = "pub", set = "pub")]
#[serde(default, rename_all = "kebab-case")]
pub struct SolveOptions {
    /// Which profit equation to use.
    profit_form: ProfitForm,
    /// How the wage basket is composed.
    basket: WageBasket,
    /// The sector (1-based) whose price is fixed to 1. Defaults to the last.
    numeraire: Option<usize>,
}

impl SolveOptions {
    pub fn builder() -> SolveOptionsBuilder {
        SolveOptionsBuilder::default()
    }

    /// The zero-based numeraire index for an economy with `sectors` sectors.
    pub fn numeraire_index(&self, sectors: usize) -> Result<usize> {
        match self.numeraire {
            None => Ok(sectors.saturating_sub(1)),
            Some(sector) if (1..=sectors).contains(&sector) => Ok(sector - 1),
            Some(sector) => Err(Error::Config(format!("numeraire sector {} is not between 1 and {}", sector, sectors))),
        }
    }
}

/// The outcome of the profit stage.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct PriceSystem {
    /// Every price, numeraire included.
    prices: Vec<Value>,
    profit_rate: Value,
}

/// The outcome of the production stage.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Allocation {
    assignments: Vec<Value>,
    unassigned: Value,
}

/// Solve for the profit rate and the prices, with the price of `numeraire`
/// (zero-based) fixed to 1.
pub fn profit_stage<S: Solver + ?Sized>(solver: &S, economy: &Economy, wage_rate: &Value, policy: &dyn ProfitEquationPolicy, numeraire: usize) -> Result<PriceSystem> {
    let sectors = economy.sectors();
    if numeraire >= sectors {
        Err(Error::Config(format!("numeraire index {} out of range for {} sectors", numeraire, sectors)))?;
    }
    let profit_rate = Unknown::real("rho");
    let mut unknowns = vec![profit_rate.clone()];
    let mut entries = Vec::with_capacity(sectors);
    for i in 0..sectors {
        if i == numeraire {
            entries.push(Expr::constant(Value::one()));
        } else {
            let price = Unknown::non_negative(format!("p{}", i + 1));
            entries.push(price.expr());
            unknowns.push(price);
        }
    }
    let prices = vector(entries);
    let equations = policy.equations(
        economy.technology(),
        &prices,
        economy.labor(),
        &Expr::constant(wage_rate.clone()),
        &profit_rate.expr(),
    )?;
    debug!(equations = %display_all(&equations), "profit stage");

    let solution = exactly_one(solve_system(solver, &equations, &unknowns)?)?;
    let prices = prices.subs_all(&unknowns, &solution).values()?;
    let profit_rate = solution.into_iter().next()
        .ok_or_else(|| Error::Normalization("profit stage solution is empty".into()))?;
    debug!(profit_rate = %profit_rate, prices = %display_all(&prices), "profit stage solved");
    Ok(PriceSystem { prices, profit_rate })
}

/// Solve for the wage basket at the given prices.
pub fn wage_stage<S: Solver + ?Sized>(solver: &S, prices: &[Value], wage_rate: &Value, policy: &dyn WageBasketPolicy) -> Result<Vec<Value>> {
    let free = Unknown::non_negative("w1");
    let basket = policy.basket(prices.len(), &free)?;
    let equation = Equation::new(dot(&basket, &value_vector(prices.to_vec()))?, Expr::constant(wage_rate.clone()));
    debug!(equation = %equation, "wage stage");

    let unknowns = [free];
    let solution = exactly_one(solve_system(solver, &[equation], &unknowns)?)?;
    let wages = basket.subs_all(&unknowns, &solution).values()?;
    debug!(wages = %display_all(&wages), "wage stage solved");
    Ok(wages)
}

/// Solve for the number of workers in each sector given the wage basket.
pub fn production_stage<S: Solver + ?Sized>(solver: &S, economy: &Economy, wages: &[Value]) -> Result<Allocation> {
    let sectors = economy.sectors();
    if wages.len() != sectors {
        Err(Error::Shape(format!("{} wages for {} sectors", wages.len(), sectors)))?;
    }
    let unknowns = (1..=sectors)
        .map(|i| Unknown::real(format!("k{}", i)))
        .collect::<Vec<_>>();
    let assignments = vector(unknowns.iter().map(|k| k.expr()).collect());
    // output each sector needs to employ k workers
    let output = hadamard(&assignments, &hadamard_inverse(economy.labor())?)?;
    let consumption = value_vector(wages.to_vec()).scale(&Expr::constant(economy.population().clone()));
    let requirements = economy.technology().transpose().mul(&output)?.add(&consumption)?;
    let equations = equate(&output, &requirements)?;
    debug!(equations = %display_all(&equations), "production stage");

    let solution = exactly_one(solve_system(solver, &equations, &unknowns)?)?;
    let assignments = assignments.subs_all(&unknowns, &solution);
    let assigned = sum_vector(&assignments)?
        .as_value()
        .ok_or_else(|| Error::NonConstant(assignments.to_string()))?;
    let unassigned = economy.population().clone() - assigned;
    let assignments = assignments.values()?;
    debug!(assignments = %display_all(&assignments), unassigned = %unassigned, "production stage solved");
    Ok(Allocation { assignments, unassigned })
}

/// Run all three stages at one wage rate.
///
/// Degenerate states (negative profit rate, negative prices...) are returned
/// like any other state and logged at `warn`.
pub fn solve<S: Solver + ?Sized>(solver: &S, economy: &Economy, wage_rate: &Value, options: &SolveOptions) -> Result<EquilibriumState> {
    let numeraire = options.numeraire_index(economy.sectors())?;
    debug!(wage_rate = %wage_rate, profit_form = ?options.profit_form(), basket = ?options.basket(), numeraire = numeraire + 1, "solving equilibrium");

    let price_system = profit_stage(solver, economy, wage_rate, options.profit_form(), numeraire)
        .map_err(|e| e.in_stage(Stage::Profit, wage_rate))?;
    let wages = wage_stage(solver, price_system.prices(), wage_rate, options.basket())
        .map_err(|e| e.in_stage(Stage::Wage, wage_rate))?;
    let allocation = production_stage(solver, economy, &wages)
        .map_err(|e| e.in_stage(Stage::Production, wage_rate))?;

    let PriceSystem { prices, profit_rate } = price_system;
    let Allocation { assignments, unassigned } = allocation;
    let state = EquilibriumState::new(wage_rate.clone(), prices, profit_rate, wages, assignments, unassigned)?;
    for degeneracy in state.degeneracies() {
        warn!(wage_rate = %wage_rate, "degenerate equilibrium: {}", degeneracy);
    }
    Ok(state)
}

/// Solve at each wage rate in turn. A failure at one rate doesn't stop the
/// others.
pub fn solve_rates<S: Solver + ?Sized>(solver: &S, economy: &Economy, rates: &[Value], options: &SolveOptions) -> Vec<(Value, Result<EquilibriumState>)> {
    rates.iter()
        .map(|rate| (rate.clone(), solve(solver, economy, rate, options)))
        .collect()
}

fn display_all<T: fmt::Display>(items: &[T]) -> String {
    items.iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::SolutionCount,
        models::Degeneracy,
        solve::{EliminationSolver, RawSolution},
        util::test::*,
    };

    fn close(val: &Value, expected: f64, tol: f64) -> bool {
        (val.to_f64() - expected).abs() < tol
    }

    #[test]
    fn reference_scenario() {
        let economy = standard_economy();
        let solver = EliminationSolver::new();
        let state = solve(&solver, &economy, &num!(0.5), &SolveOptions::default()).unwrap();

        assert!(close(state.profit_rate(), 0.1261, 1e-3));
        assert!(close(&state.prices()[0], 1.1903, 1e-3));
        assert_eq!(state.prices()[1], Value::one());

        // substituting back into the profit equation leaves (almost) nothing
        let equations = ProfitForm::WagesAdvanced.equations(
            economy.technology(),
            &value_vector(state.prices().clone()),
            economy.labor(),
            &Expr::constant(num!(0.5)),
            &Expr::constant(state.profit_rate().clone()),
        ).unwrap();
        for eq in equations {
            let residual = eq.residual().as_value().unwrap();
            assert!(residual.to_f64().abs() < 1e-6);
        }

        let basket_value = dot(&value_vector(state.wages().clone()), &value_vector(state.prices().clone())).unwrap();
        assert!(close(&basket_value.as_value().unwrap(), 0.5, 1e-9));
        assert_eq!(state.wages()[0], state.wages()[1]);

        let assigned = state.assignments()[0].to_f64() + state.assignments()[1].to_f64();
        assert!(assigned <= 100.0);
        assert!(state.unassigned().to_f64() >= 0.0);
        assert!(close(&state.assignments()[0], 48.06, 0.05));
        assert!(close(&state.assignments()[1], 27.03, 0.05));
        assert!(state.is_feasible());
    }

    #[test]
    fn near_maximum_wage() {
        // the maximum wage for this economy is 0.38 / 0.55 = 0.690909...
        let state = solve(&EliminationSolver::new(), &standard_economy(), &num!(0.6909), &SolveOptions::default()).unwrap();
        let rho = state.profit_rate().to_f64();
        assert!(rho > 0.0 && rho < 1e-3);
        assert!(state.is_feasible());
    }

    #[test]
    fn wage_above_maximum_is_flagged() {
        let state = solve(&EliminationSolver::new(), &standard_economy(), &num!(0.8), &SolveOptions::default()).unwrap();
        assert!(close(state.profit_rate(), -0.0586, 1e-3));
        assert!(!state.is_feasible());
        assert!(matches!(state.degeneracies()[0], Degeneracy::NegativeProfitRate { .. }));
    }

    #[test]
    fn post_factum_wages() {
        let options = SolveOptions::builder()
            .profit_form(ProfitForm::WagesPostFactum)
            .build()
            .unwrap();
        let state = solve(&EliminationSolver::new(), &standard_economy(), &num!(0.5), &options).unwrap();
        assert!(close(state.profit_rate(), 0.191, 1e-3));
        assert!(close(&state.prices()[0], 1.1485, 1e-3));
    }

    #[test]
    fn numeraire_choice() {
        let options = SolveOptions::builder()
            .numeraire(Some(1usize))
            .build()
            .unwrap();
        let economy = standard_economy();
        let state = solve(&EliminationSolver::new(), &economy, &num!(0.5), &options).unwrap();
        // the wage is paid in units of the numeraire good, so moving the
        // numeraire changes the real wage and with it the profit rate
        assert_eq!(state.prices()[0], Value::one());
        assert!(close(&state.prices()[1], 0.8028, 1e-3));
        assert!(close(state.profit_rate(), 0.0411, 1e-3));
        let equations = ProfitForm::WagesAdvanced.equations(
            economy.technology(),
            &value_vector(state.prices().clone()),
            economy.labor(),
            &Expr::constant(num!(0.5)),
            &Expr::constant(state.profit_rate().clone()),
        ).unwrap();
        for eq in equations {
            assert!(eq.residual().as_value().unwrap().to_f64().abs() < 1e-6);
        }

        let options = SolveOptions::builder().numeraire(Some(3usize)).build().unwrap();
        let res = solve(&EliminationSolver::new(), &standard_economy(), &num!(0.5), &options);
        assert!(matches!(res, Err(Error::Config(_))));
        assert_eq!(SolveOptions::default().numeraire_index(3).unwrap(), 2);
    }

    #[test]
    fn exact_wage_stage() {
        let prices = vec![Value::ratio(3, 2).unwrap(), Value::one()];
        let wages = wage_stage(&EliminationSolver::new(), &prices, &Value::ratio(1, 2).unwrap(), &WageBasket::default()).unwrap();
        assert_eq!(wages, vec![Value::ratio(1, 5).unwrap(), Value::ratio(1, 5).unwrap()]);
        assert!(wages.iter().all(|w| w.is_exact()));

        let basket = WageBasket::Equal { active: Some(vec![1]) };
        let wages = wage_stage(&EliminationSolver::new(), &prices, &Value::ratio(1, 2).unwrap(), &basket).unwrap();
        assert_eq!(wages, vec![Value::ratio(1, 3).unwrap(), Value::zero()]);
    }

    #[test]
    fn exact_production_stage() {
        let wages = vec![Value::ratio(1, 5).unwrap(), Value::ratio(1, 5).unwrap()];
        let allocation = production_stage(&EliminationSolver::new(), &standard_economy(), &wages).unwrap();
        assert_eq!(allocation.assignments(), &vec![Value::ratio(800, 19).unwrap(), Value::ratio(450, 19).unwrap()]);
        assert_eq!(allocation.unassigned(), &Value::ratio(650, 19).unwrap());

        let res = production_stage(&EliminationSolver::new(), &standard_economy(), &wages[0..1]);
        assert!(matches!(res, Err(Error::Shape(_))));
    }

    #[test]
    fn three_sectors() {
        let state = solve(&EliminationSolver::new(), &three_sector_economy(), &num!(0.3), &SolveOptions::default()).unwrap();
        assert!(close(state.profit_rate(), 0.6039, 1e-3));
        assert!(close(&state.prices()[0], 1.2865, 1e-3));
        assert!(close(&state.prices()[1], 1.4486, 1e-3));
        assert_eq!(state.prices()[2], Value::one());
        assert_eq!(state.assignments().len(), 3);
    }

    #[test]
    fn single_sector_is_linear() {
        // p = (1+ρ)(0.5p + ω) with p = 1 and ω = 0.25 gives ρ = 1/3
        let economy = Economy::new(vec![vec![num!(0.5)]], vec![num!(1)], num!(10)).unwrap();
        let state = solve(&EliminationSolver::new(), &economy, &num!(0.25), &SolveOptions::default()).unwrap();
        assert_eq!(state.profit_rate(), &Value::ratio(1, 3).unwrap());
        assert_eq!(state.prices(), &vec![Value::one()]);
        assert_eq!(state.wages(), &vec![num!(0.25)]);
        // k = 0.5k + 2.5
        assert_eq!(state.assignments(), &vec![num!(5)]);
        assert_eq!(state.unassigned(), &num!(5));
    }

    struct Nothing;
    impl Solver for Nothing {
        fn solve(&self, _equations: &[Equation], _unknowns: &[Unknown]) -> Result<RawSolution> {
            Ok(RawSolution::List(vec![]))
        }
    }

    #[test]
    fn failures_carry_context() {
        let res = solve(&Nothing, &standard_economy(), &num!(0.5), &SolveOptions::default());
        let err = res.unwrap_err();
        assert_eq!(err, Error::AmbiguousSolution { found: SolutionCount::Finite(0) }.in_stage(Stage::Profit, num!(0.5)));
        assert_eq!(err.to_string(), "profit stage failed at wage rate 0.5: expected exactly one solution, found 0");
        assert!(!err.is_fatal());
    }

    #[test]
    fn rates_are_independent() {
        let economy = standard_economy();
        let results = solve_rates(&EliminationSolver::new(), &economy, &[num!(0.5), num!(0.8), num!(0.4)], &SolveOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].0, num!(0.8));
        assert!(results.iter().all(|(_, res)| res.is_ok()));

        let results = solve_rates(&Nothing, &economy, &[num!(0.5), num!(0.4)], &SolveOptions::default());
        assert!(results.iter().all(|(_, res)| res.is_err()));
    }

    #[test]
    fn options_deserialize() {
        let options: SolveOptions = toml::from_str(r#"
profit-form = "wages-post-factum"
numeraire = 1
[basket]
kind = "equal"
active = [1, 2]
"#).unwrap();
        assert_eq!(options.profit_form(), &ProfitForm::WagesPostFactum);
        assert_eq!(options.numeraire(), &Some(1));
        assert_eq!(options.basket(), &WageBasket::Equal { active: Some(vec![1, 2]) });
        let options: SolveOptions = toml::from_str("").unwrap();
        assert_eq!(options, SolveOptions::default());
    }
}
