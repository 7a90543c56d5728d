use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propinvest_core::costs::CostProfile;
use propinvest_core::returns::{self, Financing, InvestmentScenario};
use propinvest_core::trajectory;
use propinvest_core::PolicyConfig;

use crate::input;

/// Flags describing a purchase when no input file is given
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to JSON/YAML scenario file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Monthly rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Loan-to-value in percent
    #[arg(long, default_value = "75")]
    pub ltv: Decimal,

    /// Annual mortgage rate in percent
    #[arg(long, default_value = "4.5")]
    pub rate: Decimal,

    /// Mortgage term in years
    #[arg(long, default_value_t = 25)]
    pub term: u32,

    /// Annual property appreciation in percent
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub appreciation: Decimal,

    /// Projection horizon in years
    #[arg(long, default_value_t = 10)]
    pub horizon: u32,
}

impl ScenarioArgs {
    fn scenario(&self) -> Result<InvestmentScenario, Box<dyn std::error::Error>> {
        if let Some(scenario) = input::read_input(self.input.as_deref())? {
            return Ok(scenario);
        }
        Ok(InvestmentScenario {
            property_price: self.price.ok_or("--price is required (or provide --input)")?,
            monthly_rent: self.rent.ok_or("--rent is required (or provide --input)")?,
            financing: Financing {
                loan_to_value_pct: self.ltv,
                annual_rate_pct: self.rate,
                term_years: self.term,
            },
            costs: CostProfile::default(),
            appreciation_rate_pct: self.appreciation,
            horizon_years: self.horizon,
        })
    }
}

/// Arguments for single-year return metrics
#[derive(Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Loan year to evaluate (1 = first year)
    #[arg(long, default_value_t = 1)]
    pub year: u32,
}

pub fn run_evaluate(
    args: EvaluateArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = args.scenario.scenario()?;
    let result = returns::evaluate_scenario(&scenario, policy, args.year)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the multi-year projection
#[derive(Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

pub fn run_project(
    args: ProjectArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = args.scenario.scenario()?;
    let result = trajectory::project_returns(&scenario, policy)?;
    Ok(serde_json::to_value(result)?)
}
