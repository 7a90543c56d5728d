use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use propinvest_core::costs::CostProfile;
use propinvest_core::returns::Financing;
use propinvest_core::sensitivity::{
    self, SensitivityInput, SensitivityVariable, SweepVariable,
};
use propinvest_core::solver::{self, FairPriceInput, TargetMetric};
use propinvest_core::PolicyConfig;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetArg {
    /// Net rental yield
    Yield,
    /// Cash-on-cash return
    Coc,
}

impl From<TargetArg> for TargetMetric {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Yield => TargetMetric::NetRentalYield,
            TargetArg::Coc => TargetMetric::CashOnCashReturn,
        }
    }
}

/// Arguments for the fair price search
#[derive(Args)]
pub struct FairPriceArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Metric to match
    #[arg(long, value_enum, default_value = "yield")]
    pub target: TargetArg,

    /// Target value of the metric in percent
    #[arg(long)]
    pub target_value: Option<Decimal>,

    /// Loan-to-value in percent
    #[arg(long, default_value = "75")]
    pub ltv: Decimal,

    /// Annual mortgage rate in percent
    #[arg(long, default_value = "4.5")]
    pub rate: Decimal,

    /// Mortgage term in years
    #[arg(long, default_value_t = 25)]
    pub term: u32,

    /// Cap on monthly net cash flow
    #[arg(long, allow_hyphen_values = true)]
    pub max_cash_flow: Option<Decimal>,
}

impl FairPriceArgs {
    fn fair_price_input(&self) -> Result<FairPriceInput, Box<dyn std::error::Error>> {
        if let Some(parsed) = input::read_input(self.input.as_deref())? {
            return Ok(parsed);
        }
        Ok(FairPriceInput {
            monthly_rent: self.rent.ok_or("--rent is required (or provide --input)")?,
            financing: Financing {
                loan_to_value_pct: self.ltv,
                annual_rate_pct: self.rate,
                term_years: self.term,
            },
            costs: CostProfile::default(),
            appreciation_rate_pct: Decimal::ZERO,
            target: self.target.into(),
            target_value_pct: self
                .target_value
                .ok_or("--target-value is required (or provide --input)")?,
            max_monthly_cash_flow: self.max_cash_flow,
        })
    }
}

pub fn run_fair_price(
    args: FairPriceArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let fair_price_input = args.fair_price_input()?;
    let result = solver::solve_fair_price(&fair_price_input, policy)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the fair price sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub base: FairPriceArgs,

    /// Row variable in format name:min:max:step
    /// (e.g. "monthly_rent:1200:1800:100")
    #[arg(long)]
    pub rows: String,

    /// Column variable in format name:min:max:step
    /// (e.g. "annual_rate_pct:3:6:0.5")
    #[arg(long)]
    pub columns: String,
}

fn parse_sweep(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    let variable = match parts[0] {
        "monthly_rent" | "rent" => SweepVariable::MonthlyRent,
        "annual_rate_pct" | "rate" => SweepVariable::AnnualRatePct,
        "target_value_pct" | "target" => SweepVariable::TargetValuePct,
        "loan_to_value_pct" | "ltv" => SweepVariable::LoanToValuePct,
        other => {
            return Err(format!(
                "Unknown sensitivity variable '{}': expected monthly_rent, annual_rate_pct, \
                 target_value_pct or loan_to_value_pct",
                other
            )
            .into())
        }
    };
    Ok(SensitivityVariable {
        variable,
        min: parts[1].parse()?,
        max: parts[2].parse()?,
        step: parts[3].parse()?,
    })
}

pub fn run_sensitivity(
    args: SensitivityArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sensitivity_input = SensitivityInput {
        base: args.base.fair_price_input()?,
        rows: parse_sweep(&args.rows)?,
        columns: parse_sweep(&args.columns)?,
    };
    let result = sensitivity::fair_price_sensitivity(&sensitivity_input, policy)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_sweep_aliases() {
        let v = parse_sweep("rent:1000:2000:250").unwrap();
        assert_eq!(v.variable, SweepVariable::MonthlyRent);
        assert_eq!(v.step, dec!(250));
    }

    #[test]
    fn test_parse_sweep_rejects_bad_shape() {
        assert!(parse_sweep("rent:1000:2000").is_err());
        assert!(parse_sweep("price:1:2:1").is_err());
    }
}
