use propinvest_core::costs::CostProfile;
use propinvest_core::returns::{
    cash_on_cash_return, compute_metrics, evaluate_scenario, Financing, InvestmentScenario,
};
use propinvest_core::trajectory::project_returns;
use propinvest_core::{PolicyConfig, PropInvestError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn scenario(price: Decimal) -> InvestmentScenario {
    InvestmentScenario {
        property_price: price,
        monthly_rent: dec!(1500),
        financing: Financing::default(),
        costs: CostProfile::default(),
        appreciation_rate_pct: dec!(3),
        horizon_years: 10,
    }
}

// ===========================================================================
// Single-year metrics
// ===========================================================================

#[test]
fn test_yield_at_reference_prices() {
    let policy = PolicyConfig::default();
    let at_200k = compute_metrics(&scenario(dec!(200000)), &policy, 1).unwrap();
    let at_300k = compute_metrics(&scenario(dec!(300000)), &policy, 1).unwrap();
    assert!(
        (at_200k.net_rental_yield_pct - dec!(4.84)).abs() < dec!(0.05),
        "got {}",
        at_200k.net_rental_yield_pct
    );
    assert!(
        (at_300k.net_rental_yield_pct - dec!(2.66)).abs() < dec!(0.05),
        "got {}",
        at_300k.net_rental_yield_pct
    );
}

#[test]
fn test_metrics_fall_as_price_rises() {
    let policy = PolicyConfig::default();
    let mut previous = None;
    for price in [dec!(100000), dec!(150000), dec!(200000), dec!(250000), dec!(300000)] {
        let m = compute_metrics(&scenario(price), &policy, 1).unwrap();
        if let Some((y, c, f)) = previous {
            assert!(m.net_rental_yield_pct < y);
            assert!(m.cash_on_cash_return_pct < c);
            assert!(m.monthly_net_cash_flow < f);
        }
        previous = Some((
            m.net_rental_yield_pct,
            m.cash_on_cash_return_pct,
            m.monthly_net_cash_flow,
        ));
    }
}

#[test]
fn test_cash_flow_sign_around_rent_coverage() {
    let policy = PolicyConfig::default();
    let cheap = compute_metrics(&scenario(dec!(200000)), &policy, 1).unwrap();
    let dear = compute_metrics(&scenario(dec!(300000)), &policy, 1).unwrap();
    assert!(cheap.monthly_net_cash_flow > Decimal::ZERO);
    assert!(dear.monthly_net_cash_flow < Decimal::ZERO);
}

#[test]
fn test_cash_on_cash_uses_total_acquisition() {
    let m = compute_metrics(&scenario(dec!(200000)), &PolicyConfig::default(), 1).unwrap();
    let expected = (m.net_income_after_tax + m.mortgage_principal) / m.acquisition_costs.total
        * dec!(100);
    assert_eq!(m.cash_on_cash_return_pct, expected);
}

#[test]
fn test_zero_acquisition_is_division_by_zero() {
    let err = cash_on_cash_return(dec!(1000), dec!(100), Decimal::ZERO).unwrap_err();
    assert!(matches!(err, PropInvestError::DivisionByZero { .. }));
}

#[test]
fn test_zero_price_rejected() {
    let err = compute_metrics(&scenario(Decimal::ZERO), &PolicyConfig::default(), 1).unwrap_err();
    assert!(matches!(err, PropInvestError::InvalidInput { .. }));
}

#[test]
fn test_rent_shortfall_warnings() {
    let out = evaluate_scenario(&scenario(dec!(400000)), &PolicyConfig::default(), 1).unwrap();
    assert!(!out.result.rent_covers_mortgage);
    assert!(out.warnings.iter().any(|w| w.contains("does not cover")));
    assert!(out.warnings.iter().any(|w| w.contains("Negative monthly cash flow")));
}

#[test]
fn test_year_after_term_has_no_mortgage() {
    let mut s = scenario(dec!(200000));
    s.financing.term_years = 5;
    let m = compute_metrics(&s, &PolicyConfig::default(), 6).unwrap();
    assert_eq!(m.mortgage_interest, Decimal::ZERO);
    assert_eq!(m.mortgage_principal, Decimal::ZERO);
    assert_eq!(m.monthly_rent_surplus, dec!(1500));
}

// ===========================================================================
// Trajectory
// ===========================================================================

#[test]
fn test_trajectory_final_values() {
    let out = project_returns(&scenario(dec!(200000)), &PolicyConfig::default()).unwrap();
    let t = &out.result;
    assert_eq!(t.snapshots.len(), 10);
    let last = t.snapshots.last().unwrap();
    assert_eq!(t.final_equity, last.equity);
    assert_eq!(t.final_net_return_pct, Some(last.net_return_pct));
    assert!(last.property_value > dec!(268000) && last.property_value < dec!(269000));
    assert!(last.net_return_pct > Decimal::ZERO);
}

#[test]
fn test_trajectory_net_return_formula() {
    let out = project_returns(&scenario(dec!(250000)), &PolicyConfig::default()).unwrap();
    let t = &out.result;
    for s in &t.snapshots {
        let expected = (s.equity + s.cumulative_rent - s.cumulative_cost
            - t.total_acquisition_cost)
            / t.total_acquisition_cost
            * dec!(100);
        assert_eq!(s.net_return_pct, expected);
        assert!(s.annualized_return_pct.is_some());
        assert!(s.year_over_year_return_pct.is_some());
    }
}

#[test]
fn test_trajectory_past_term_warns() {
    let mut s = scenario(dec!(200000));
    s.financing.term_years = 5;
    s.horizon_years = 8;
    let out = project_returns(&s, &PolicyConfig::default()).unwrap();
    assert_eq!(out.result.snapshots[7].loan_balance, Decimal::ZERO);
    assert!(out.warnings.iter().any(|w| w.contains("mortgage term")));
}
