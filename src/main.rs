//! `sraffa` evaluates an economy at a list of wage rates and prints one row
//! per rate.
//!
//! ```text
//! sraffa                                  # the two-sector reference economy
//! sraffa --config demos/three_sector.toml
//! sraffa --rates 0.5 0.45 --profit-form wages-post-factum --json
//! ```
//!
//! Logs go to stderr and are controlled with `RUST_LOG` (default `warn`).

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use sraffa_core::{
    config::RunConfig,
    display::equilibrium_table,
    solve::EliminationSolver,
    system::{ProfitForm, solve_rates},
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfitFormArg {
    WagesAdvanced,
    WagesPostFactum,
}

impl From<ProfitFormArg> for ProfitForm {
    fn from(arg: ProfitFormArg) -> Self {
        match arg {
            ProfitFormArg::WagesAdvanced => ProfitForm::WagesAdvanced,
            ProfitFormArg::WagesPostFactum => ProfitForm::WagesPostFactum,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sraffa")]
#[command(about = "Solve a linear production economy for prices, profit, wages and labor allocation")]
struct Cli {
    /// TOML run configuration (defaults to the two-sector reference economy)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wage rates to evaluate, replacing the configured ones
    #[arg(short, long, num_args = 1..)]
    rates: Vec<Decimal>,

    /// Decimal places shown in the table
    #[arg(short, long)]
    precision: Option<u32>,

    /// Which profit equation to use
    #[arg(long, value_enum)]
    profit_form: Option<ProfitFormArg>,

    /// Print the equilibrium states as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if !cli.rates.is_empty() {
        config.set_wage_rates(cli.rates.clone());
    }
    if let Some(precision) = cli.precision {
        config.set_precision(precision);
    }
    if let Some(form) = cli.profit_form {
        let mut options = config.options().clone();
        options.set_profit_form(form.into());
        config.set_options(options);
    }
    if config.wage_rates().is_empty() {
        bail!("no wage rates to evaluate; pass --rates or set wage-rates in the config");
    }

    let economy = config.economy()?;
    tracing::info!(sectors = economy.sectors(), options = ?config.options(), "economy loaded");
    let results = solve_rates(&EliminationSolver::new(), &economy, &config.rates(), config.options());

    if let Some(err) = results.iter().filter_map(|(_, res)| res.as_ref().err()).find(|e| e.is_fatal()) {
        bail!("internal error while solving: {}", err);
    }

    if cli.json {
        let rows = results.iter()
            .map(|(rate, res)| match res {
                Ok(state) => serde_json::json!({
                    "wage_rate": rate,
                    "state": state,
                    "degeneracies": state.degeneracies(),
                }),
                Err(err) => serde_json::json!({
                    "wage_rate": rate,
                    "error": err.to_string(),
                }),
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", equilibrium_table(&results, *config.precision())?);
    }
    Ok(())
}
