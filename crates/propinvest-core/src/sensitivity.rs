use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::PolicyConfig;
use crate::error::PropInvestError;
use crate::solver::{solve_fair_price, FairPriceInput};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::PropInvestResult;

/// Input field a sensitivity axis varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepVariable {
    MonthlyRent,
    AnnualRatePct,
    TargetValuePct,
    LoanToValuePct,
}

impl SweepVariable {
    fn apply(&self, input: &mut FairPriceInput, value: Decimal) {
        match self {
            SweepVariable::MonthlyRent => input.monthly_rent = value,
            SweepVariable::AnnualRatePct => input.financing.annual_rate_pct = value,
            SweepVariable::TargetValuePct => input.target_value_pct = value,
            SweepVariable::LoanToValuePct => input.financing.loan_to_value_pct = value,
        }
    }
}

/// One axis of the grid, swept from `min` to `max` by `step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub variable: SweepVariable,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    /// Base case; swept fields are overwritten at each grid point
    pub base: FairPriceInput,
    pub rows: SensitivityVariable,
    pub columns: SensitivityVariable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub row_variable: SweepVariable,
    pub column_variable: SweepVariable,
    pub row_values: Vec<Decimal>,
    pub column_values: Vec<Decimal>,
    /// `fair_prices[i][j]` is the fair price at `row_values[i]` and
    /// `column_values[j]`; `None` where no price satisfies the constraints
    pub fair_prices: Vec<Vec<Option<Money>>>,
    pub solved_cells: usize,
    pub failed_cells: usize,
}

/// Points from `min` to `max`, failing once more than `limit` are needed.
fn sweep_values(var: &SensitivityVariable, limit: usize) -> PropInvestResult<Vec<Decimal>> {
    let field = format!("{:?}", var.variable);
    if var.step <= Decimal::ZERO {
        return Err(PropInvestError::InvalidInput {
            field,
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(PropInvestError::InvalidInput {
            field,
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current += var.step;
        if values.len() > limit {
            return Err(too_many_points(field, limit));
        }
    }
    // Include max when the step overshoots it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }
    if values.len() > limit {
        return Err(too_many_points(field, limit));
    }
    Ok(values)
}

fn too_many_points(field: String, limit: usize) -> PropInvestError {
    PropInvestError::InvalidInput {
        field,
        reason: format!(
            "Sweep needs more than {limit} points to fit solver.max_grid_cells; widen the step or narrow the range"
        ),
    }
}

/// Solve the fair price at every point of a two-way grid.
pub fn fair_price_sensitivity(
    input: &SensitivityInput,
    policy: &PolicyConfig,
) -> PropInvestResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    policy.validate()?;
    if input.rows.variable == input.columns.variable {
        return Err(PropInvestError::InvalidInput {
            field: "columns.variable".into(),
            reason: "Rows and columns must sweep different variables".into(),
        });
    }

    let limit = policy.solver.max_grid_cells as usize;
    let row_values = sweep_values(&input.rows, limit)?;
    let column_values = sweep_values(&input.columns, limit / row_values.len())?;

    let mut fair_prices = Vec::with_capacity(row_values.len());
    let mut solved_cells = 0usize;
    let mut failed_cells = 0usize;

    for row in &row_values {
        let mut cells = Vec::with_capacity(column_values.len());
        for column in &column_values {
            let mut point = input.base.clone();
            input.rows.variable.apply(&mut point, *row);
            input.columns.variable.apply(&mut point, *column);

            match solve_fair_price(&point, policy) {
                Ok(out) => {
                    solved_cells += 1;
                    cells.push(Some(out.result.fair_price));
                }
                Err(e) => {
                    failed_cells += 1;
                    warnings.push(format!(
                        "{:?}={row}, {:?}={column}: {e}",
                        input.rows.variable, input.columns.variable
                    ));
                    cells.push(None);
                }
            }
        }
        fair_prices.push(cells);
    }

    let output = SensitivityOutput {
        row_variable: input.rows.variable,
        column_variable: input.columns.variable,
        row_values,
        column_values,
        fair_prices,
        solved_cells,
        failed_cells,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fair Price 2-Way Sensitivity Grid",
        &serde_json::json!({
            "base": input.base,
            "rows": input.rows,
            "columns": input.columns,
        }),
        warnings,
        elapsed,
        output,
    ))
}
