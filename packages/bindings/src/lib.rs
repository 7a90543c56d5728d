use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use propinvest_core::costs;
use propinvest_core::PolicyConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional policy, falling back to the built-in defaults.
fn parse_policy(policy_json: Option<String>) -> NapiResult<PolicyConfig> {
    match policy_json {
        Some(json) => PolicyConfig::from_json_str(&json).map_err(to_napi_error),
        None => Ok(PolicyConfig::default()),
    }
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| to_napi_error(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// Mortgage
// ---------------------------------------------------------------------------

#[napi]
pub fn build_amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: propinvest_core::amortization::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propinvest_core::amortization::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tax and costs
// ---------------------------------------------------------------------------

#[napi]
pub fn corporation_tax(profit: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = parse_policy(policy_json)?;
    let profit = parse_decimal("profit", &profit)?;
    let output = propinvest_core::tax::corporation_tax(profit, &policy.corporation_tax);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn stamp_duty(price: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = parse_policy(policy_json)?;
    let price = parse_decimal("price", &price)?;
    let output = costs::stamp_duty_breakdown(price, &policy.stamp_duty);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn purchase_costs(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = parse_policy(policy_json)?;
    let input: costs::PurchaseCostsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = costs::purchase_costs(&input, &policy.stamp_duty).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_scenario(
    input_json: String,
    year: Option<u32>,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let policy = parse_policy(policy_json)?;
    let input: propinvest_core::returns::InvestmentScenario =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = propinvest_core::returns::evaluate_scenario(&input, &policy, year.unwrap_or(1))
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_returns(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = parse_policy(policy_json)?;
    let input: propinvest_core::returns::InvestmentScenario =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propinvest_core::trajectory::project_returns(&input, &policy).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Fair price
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_fair_price(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = parse_policy(policy_json)?;
    let input: propinvest_core::solver::FairPriceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propinvest_core::solver::solve_fair_price(&input, &policy).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn fair_price_sensitivity(
    input_json: String,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let policy = parse_policy(policy_json)?;
    let input: propinvest_core::sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = propinvest_core::sensitivity::fair_price_sensitivity(&input, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
