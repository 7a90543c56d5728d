use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propinvest_core::costs::{purchase_costs, stamp_duty_breakdown, CostProfile, PurchaseCostsInput};
use propinvest_core::tax::corporation_tax;
use propinvest_core::PolicyConfig;

use crate::input;

/// Arguments for corporation tax on a year's profit
#[derive(Args)]
pub struct TaxArgs {
    /// Taxable profit for the year
    #[arg(long, allow_hyphen_values = true)]
    pub profit: Decimal,
}

pub fn run_tax(args: TaxArgs, policy: &PolicyConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let assessment = corporation_tax(args.profit, &policy.corporation_tax);
    Ok(serde_json::to_value(assessment)?)
}

/// Arguments for stamp duty on a purchase
#[derive(Args)]
pub struct StampDutyArgs {
    /// Purchase price
    #[arg(long)]
    pub price: Decimal,
}

pub fn run_stamp_duty(
    args: StampDutyArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let breakdown = stamp_duty_breakdown(args.price, &policy.stamp_duty);
    Ok(serde_json::to_value(breakdown)?)
}

/// Arguments for running and acquisition costs
#[derive(Args)]
pub struct CostsArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
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
}

pub fn run_costs(args: CostsArgs, policy: &PolicyConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let request: PurchaseCostsInput = match input::read_input(args.input.as_deref())? {
        Some(request) => request,
        None => PurchaseCostsInput {
            property_price: args.price.ok_or("--price is required (or provide --input)")?,
            monthly_rent: args.rent.ok_or("--rent is required (or provide --input)")?,
            loan_to_value_pct: args.ltv,
            costs: CostProfile::default(),
        },
    };
    let summary = purchase_costs(&request, &policy.stamp_duty)?;
    Ok(serde_json::to_value(summary)?)
}
