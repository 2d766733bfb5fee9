//! Plain-text tables for equilibrium results, rendered with `tabled`.

use crate::{
    algebra::{Value, value_vector, vector_to_tuple},
    error::{Error, Result},
    models::EquilibriumState,
    util::round::{round_expr_for_display, round_for_display},
};
use std::fmt;
use tabled::settings::{Alignment, Modify, Style, object::Rows};

/// A table of already-formatted cells, rendered with aligned columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, T>(headers: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(|h| h.into()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. It must have one cell per header.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            Err(Error::Shape(format!("table row has {} cells for {} columns", row.len(), self.headers.len())))?;
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Render through `tabled` with a psql-like style: columns separated by
    /// `|` and a rule under the header.
    pub fn render(&self) -> String {
        let data = std::iter::once(self.headers.clone())
            .chain(self.rows.iter().cloned())
            .collect::<Vec<_>>();
        tabled::Table::from_iter(data)
            .with(Style::psql())
            .with(Modify::new(Rows::first()).with(Alignment::left()))
            .to_string()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn tuple(vals: &[Value], places: u32) -> Result<String> {
    let inner = vector_to_tuple(&value_vector(vals.to_vec()))?
        .iter()
        .map(|entry| round_expr_for_display(entry, places).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("({})", inner))
}

/// Lay out one row per wage rate: wage rate, prices, profit rate, wages,
/// assignments, unassigned labor, and any degeneracy flags. Failed runs get
/// their error in the flags column.
pub fn equilibrium_table(results: &[(Value, Result<EquilibriumState>)], precision: u32) -> Result<Table> {
    let mut table = Table::new(vec!["wage rate", "prices", "profit", "wages", "assignments", "unassigned", "flags"]);
    for (wage_rate, result) in results {
        let rate = round_for_display(wage_rate, precision).to_string();
        let row = match result {
            Ok(state) => {
                let flags = state.degeneracies()
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![
                    rate,
                    tuple(state.prices(), precision)?,
                    round_for_display(state.profit_rate(), precision).to_string(),
                    tuple(state.wages(), precision)?,
                    tuple(state.assignments(), precision)?,
                    round_for_display(state.unassigned(), precision).to_string(),
                    flags,
                ]
            }
            Err(err) => {
                let mut row = vec![rate];
                row.extend(std::iter::repeat("-".to_string()).take(5));
                row.push(format!("error: {}", err));
                row
            }
        };
        table.push_row(row)?;
    }
    Ok(table)
}
