use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::remaining_balance;
use crate::config::PolicyConfig;
use crate::returns::{compute_metrics, year_over_year_return, InvestmentScenario};
use crate::time_value::cagr;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::PropInvestResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Position of the investment at the end of one year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSnapshot {
    pub year: u32,
    pub property_value: Money,
    pub loan_balance: Money,
    pub equity: Money,
    pub annual_rent: Money,
    /// Operating costs, mortgage interest and corporation tax for the year
    pub annual_cost: Money,
    pub cumulative_rent: Money,
    pub cumulative_cost: Money,
    /// Total return on the cash put in, to date
    pub net_return_pct: Percent,
    /// Compound annual equivalent of `net_return_pct`
    pub annualized_return_pct: Option<Percent>,
    pub year_over_year_return_pct: Option<Percent>,
}

/// Year-by-year projection over the scenario's horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnTrajectory {
    pub total_acquisition_cost: Money,
    pub initial_equity: Money,
    pub snapshots: Vec<ReturnSnapshot>,
    pub final_equity: Money,
    pub final_net_return_pct: Option<Percent>,
    /// Compound growth from the cash put in to the final equity
    pub equity_cagr_pct: Option<Percent>,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project value, debt, equity and returns for each year of the horizon.
///
/// Each year only needs the previous year's equity and the running rent and
/// cost totals, so snapshots are produced in a single forward pass.
pub fn project_returns(
    scenario: &InvestmentScenario,
    policy: &PolicyConfig,
) -> PropInvestResult<ComputationOutput<ReturnTrajectory>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    policy.validate()?;
    scenario.validate()?;

    let loan = scenario.loan_terms();
    let first_year = compute_metrics(scenario, policy, 1)?;
    let total_acquisition_cost = first_year.acquisition_costs.total;
    let initial_equity = first_year.acquisition_costs.deposit;

    if scenario.horizon_years == 0 {
        warnings.push("Horizon is zero years; no snapshots produced".into());
    }

    let mut snapshots = Vec::new();
    let mut previous_equity = initial_equity;
    let mut cumulative_rent = Decimal::ZERO;
    let mut cumulative_cost = Decimal::ZERO;

    for year in 1..=scenario.horizon_years {
        let metrics = if year == 1 {
            first_year.clone()
        } else {
            compute_metrics(scenario, policy, year)?
        };

        let property_value = scenario.property_value_at(year)?;
        let loan_balance = remaining_balance(&loan, year)?;
        let equity = property_value - loan_balance;

        let annual_rent = metrics.annual_rent;
        let annual_cost =
            metrics.operating_costs.total + metrics.mortgage_interest + metrics.tax.tax;
        cumulative_rent += annual_rent;
        cumulative_cost += annual_cost;

        let net_return_pct = (equity + cumulative_rent - cumulative_cost
            - total_acquisition_cost)
            / total_acquisition_cost
            * dec!(100);

        let growth_final = total_acquisition_cost * (Decimal::ONE + net_return_pct / dec!(100));
        let annualized_return_pct = match cagr(total_acquisition_cost, growth_final, year) {
            Ok(rate) => Some(rate),
            Err(e) => {
                warnings.push(format!("Year {year}: annualized return undefined ({e})"));
                None
            }
        };

        let year_over_year_return_pct =
            match year_over_year_return(previous_equity, equity, annual_rent, annual_cost) {
                Ok(rate) => Some(rate),
                Err(e) => {
                    warnings.push(format!("Year {year}: year-over-year return undefined ({e})"));
                    None
                }
            };

        snapshots.push(ReturnSnapshot {
            year,
            property_value,
            loan_balance,
            equity,
            annual_rent,
            annual_cost,
            cumulative_rent,
            cumulative_cost,
            net_return_pct,
            annualized_return_pct,
            year_over_year_return_pct,
        });
        previous_equity = equity;
    }

    let final_equity = snapshots
        .last()
        .map(|s| s.equity)
        .unwrap_or(initial_equity);
    let final_net_return_pct = snapshots.last().map(|s| s.net_return_pct);

    let equity_cagr_pct = if scenario.horizon_years == 0 {
        None
    } else {
        match cagr(total_acquisition_cost, final_equity, scenario.horizon_years) {
            Ok(rate) => Some(rate),
            Err(e) => {
                warnings.push(format!("Equity CAGR undefined ({e})"));
                None
            }
        }
    };

    if scenario.horizon_years > scenario.financing.term_years {
        warnings.push(format!(
            "Horizon of {} years runs past the {}-year mortgage term",
            scenario.horizon_years, scenario.financing.term_years
        ));
    }
    if snapshots.iter().any(|s| s.equity < Decimal::ZERO) {
        warnings.push("Negative equity in at least one year of the projection".into());
    }

    let output = ReturnTrajectory {
        total_acquisition_cost,
        initial_equity,
        snapshots,
        final_equity,
        final_net_return_pct,
        equity_cagr_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Multi-Year Equity and Return Projection (compound appreciation, amortizing debt)",
        &serde_json::json!({
            "scenario": scenario,
            "policy": policy,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::CostProfile;
    use crate::error::PropInvestError;
    use crate::returns::Financing;
    use rust_decimal_macros::dec;

    fn scenario(horizon_years: u32) -> InvestmentScenario {
        InvestmentScenario {
            property_price: dec!(200000),
            monthly_rent: dec!(1500),
            financing: Financing::default(),
            costs: CostProfile::default(),
            appreciation_rate_pct: dec!(3),
            horizon_years,
        }
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let out = project_returns(&scenario(0), &PolicyConfig::default()).unwrap();
        assert!(out.result.snapshots.is_empty());
        assert!(out.result.equity_cagr_pct.is_none());
        assert_eq!(out.result.final_equity, dec!(50000));
    }

    #[test]
    fn test_snapshot_count_and_years() {
        let out = project_returns(&scenario(10), &PolicyConfig::default()).unwrap();
        let years: Vec<u32> = out.result.snapshots.iter().map(|s| s.year).collect();
        assert_eq!(years, (1..=10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_equity_grows_with_appreciation_and_repayment() {
        let out = project_returns(&scenario(10), &PolicyConfig::default()).unwrap();
        for pair in out.result.snapshots.windows(2) {
            assert!(pair[1].equity > pair[0].equity);
            assert!(pair[1].loan_balance < pair[0].loan_balance);
        }
        assert!(out.result.equity_cagr_pct.is_some());
    }

    #[test]
    fn test_negative_final_equity_has_undefined_cagr() {
        let mut s = scenario(2);
        s.appreciation_rate_pct = dec!(-60);
        let out = project_returns(&s, &PolicyConfig::default()).unwrap();
        assert!(out.result.final_equity < Decimal::ZERO);
        assert!(out.result.equity_cagr_pct.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("Equity CAGR")));
    }

    #[test]
    fn test_cumulative_sums() {
        let out = project_returns(&scenario(5), &PolicyConfig::default()).unwrap();
        let snaps = &out.result.snapshots;
        let rent: Decimal = snaps.iter().map(|s| s.annual_rent).sum();
        let cost: Decimal = snaps.iter().map(|s| s.annual_cost).sum();
        assert_eq!(snaps[4].cumulative_rent, rent);
        assert_eq!(snaps[4].cumulative_cost, cost);
        assert_eq!(snaps[4].cumulative_rent, dec!(90000));
    }

    #[test]
    fn test_equity_identity() {
        let out = project_returns(&scenario(3), &PolicyConfig::default()).unwrap();
        for s in &out.result.snapshots {
            assert_eq!(s.equity, s.property_value - s.loan_balance);
        }
    }

    #[test]
    fn test_horizon_beyond_limit_rejected() {
        let mut s = scenario(600);
        s.appreciation_rate_pct = dec!(10);
        let err = project_returns(&s, &PolicyConfig::default()).unwrap_err();
        assert!(matches!(err, PropInvestError::InvalidInput { .. }));
    }

    #[test]
    fn test_overflowing_appreciation_is_error_not_panic() {
        // Doubling every year for 150 years leaves the decimal range
        let mut s = scenario(150);
        s.appreciation_rate_pct = dec!(100);
        let err = project_returns(&s, &PolicyConfig::default()).unwrap_err();
        assert!(matches!(err, PropInvestError::InvalidInput { .. }));
    }

    #[test]
    fn test_full_loan_has_undefined_first_year_over_year() {
        let mut s = scenario(2);
        s.financing.loan_to_value_pct = dec!(100);
        let out = project_returns(&s, &PolicyConfig::default()).unwrap();
        assert!(out.result.snapshots[0].year_over_year_return_pct.is_none());
        assert!(out.result.snapshots[1].year_over_year_return_pct.is_some());
        assert!(out.warnings.iter().any(|w| w.contains("year-over-year")));
    }
}
