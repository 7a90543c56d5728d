pub mod amortization;
pub mod config;
pub mod costs;
pub mod error;
pub mod returns;
pub mod tax;
pub mod time_value;
pub mod types;

#[cfg(feature = "trajectory")]
pub mod trajectory;

#[cfg(feature = "solver")]
pub mod solver;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use amortization::{build_schedule, LoanTerms};
pub use config::{PolicyConfig, SolverConfig};
pub use costs::{
    acquisition_costs, annual_operating_costs, purchase_costs, stamp_duty, CostProfile,
    PurchaseCostsInput,
};
pub use error::PropInvestError;
pub use returns::{evaluate_scenario, Financing, InvestmentScenario, ReturnMetrics};
pub use tax::{corporation_tax, CorporationTaxSchedule};
pub use types::*;

#[cfg(feature = "trajectory")]
pub use trajectory::project_returns;

#[cfg(feature = "solver")]
pub use solver::{solve_fair_price, FairPriceInput, TargetMetric};

#[cfg(feature = "sensitivity")]
pub use sensitivity::fair_price_sensitivity;

/// Standard result type for all property investment operations
pub type PropInvestResult<T> = Result<T, PropInvestError>;
