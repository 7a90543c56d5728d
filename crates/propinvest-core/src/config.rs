use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::costs::StampDutySchedule;
use crate::error::PropInvestError;
use crate::tax::CorporationTaxSchedule;
use crate::types::{Money, Percent};
use crate::PropInvestResult;

/// Search bracket and stopping rules for the fair price solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Lowest price considered
    pub min_price: Money,
    /// Highest price considered
    pub max_price: Money,
    /// Acceptable distance from the target metric, in percentage points
    pub metric_tolerance_pct: Percent,
    /// Bracket width at which the constraint searches stop
    pub price_tolerance: Money,
    /// Iteration cap for each search phase
    pub max_iterations: u32,
    /// Largest sensitivity grid solved, in cells
    pub max_grid_cells: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_price: dec!(50000),
            max_price: dec!(2000000),
            metric_tolerance_pct: dec!(0.01),
            price_tolerance: dec!(1),
            max_iterations: 100,
            max_grid_cells: 2500,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> PropInvestResult<()> {
        if self.min_price <= Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "solver.min_price".into(),
                reason: "Minimum price must be positive".into(),
            });
        }
        if self.max_price <= self.min_price {
            return Err(PropInvestError::InvalidInput {
                field: "solver.max_price".into(),
                reason: "Maximum price must exceed the minimum price".into(),
            });
        }
        if self.metric_tolerance_pct <= Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "solver.metric_tolerance_pct".into(),
                reason: "Metric tolerance must be positive".into(),
            });
        }
        if self.price_tolerance <= Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "solver.price_tolerance".into(),
                reason: "Price tolerance must be positive".into(),
            });
        }
        if self.max_iterations == 0 {
            return Err(PropInvestError::InvalidInput {
                field: "solver.max_iterations".into(),
                reason: "At least one iteration is required".into(),
            });
        }
        if self.max_grid_cells == 0 {
            return Err(PropInvestError::InvalidInput {
                field: "solver.max_grid_cells".into(),
                reason: "Sensitivity grids need at least one cell".into(),
            });
        }
        Ok(())
    }
}

/// Tax tables and solver settings. Passed explicitly to every calculation so
/// a different tax year or jurisdiction is a different value, not a code
/// change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub corporation_tax: CorporationTaxSchedule,
    pub stamp_duty: StampDutySchedule,
    pub solver: SolverConfig,
}

impl PolicyConfig {
    pub fn validate(&self) -> PropInvestResult<()> {
        self.corporation_tax.validate()?;
        self.stamp_duty.validate()?;
        self.solver.validate()
    }

    /// Parse and validate a policy from JSON. Missing sections keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> PropInvestResult<Self> {
        let policy: PolicyConfig = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }
}
