use propinvest_core::costs::{
    acquisition_costs, annual_operating_costs, stamp_duty, stamp_duty_breakdown, CostProfile,
    MaintenanceBasis, StampDutySchedule,
};
use propinvest_core::tax::{corporation_tax, CorporationTaxSchedule};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Corporation tax
// ===========================================================================

#[test]
fn test_tax_is_continuous_at_band_limits() {
    let schedule = CorporationTaxSchedule::default();
    for limit in [dec!(50000), dec!(250000)] {
        let below = corporation_tax(limit - dec!(0.01), &schedule).tax;
        let at = corporation_tax(limit, &schedule).tax;
        let above = corporation_tax(limit + dec!(0.01), &schedule).tax;
        assert!((at - below).abs() < dec!(1), "jump below {limit}: {below} -> {at}");
        assert!((above - at).abs() < dec!(1), "jump above {limit}: {at} -> {above}");
    }
}

#[test]
fn test_tax_is_non_decreasing_in_profit() {
    let schedule = CorporationTaxSchedule::default();
    let mut previous = Decimal::ZERO;
    let mut profit = dec!(-10000);
    while profit <= dec!(400000) {
        let tax = corporation_tax(profit, &schedule).tax;
        assert!(tax >= previous, "tax fell at {profit}");
        previous = tax;
        profit += dec!(2500);
    }
}

#[test]
fn test_custom_schedule() {
    let schedule = CorporationTaxSchedule {
        small_profits_limit: dec!(10000),
        upper_limit: dec!(20000),
        small_profits_rate_pct: dec!(10),
        main_rate_pct: dec!(20),
    };
    assert_eq!(corporation_tax(dec!(15000), &schedule).effective_rate_pct, dec!(15));
}

// ===========================================================================
// Stamp duty
// ===========================================================================

#[test]
fn test_stamp_duty_known_answers() {
    let schedule = StampDutySchedule::default();
    assert_eq!(stamp_duty(dec!(125000), &schedule), dec!(6250));
    assert_eq!(stamp_duty(dec!(300000), &schedule), dec!(20000));
    assert_eq!(stamp_duty(Decimal::ZERO, &schedule), Decimal::ZERO);
}

#[test]
fn test_stamp_duty_is_monotonic() {
    let schedule = StampDutySchedule::default();
    let mut previous = Decimal::ZERO;
    let mut price = Decimal::ZERO;
    while price <= dec!(2000000) {
        let duty = stamp_duty(price, &schedule);
        assert!(duty >= previous, "duty fell at {price}");
        previous = duty;
        price += dec!(25000);
    }
}

#[test]
fn test_breakdown_sums_to_total() {
    let b = stamp_duty_breakdown(dec!(400000), &StampDutySchedule::default());
    let sum: Decimal = b.bands.iter().map(|c| c.duty).sum();
    assert_eq!(sum, b.total);
    assert_eq!(b.untaxed_excess, Decimal::ZERO);
}

// ===========================================================================
// Operating and acquisition costs
// ===========================================================================

#[test]
fn test_operating_costs_total_matches_line_items() {
    let costs = CostProfile {
        service_charge: dec!(1200),
        ground_rent: dec!(250),
        ..CostProfile::default()
    };
    let b = annual_operating_costs(&costs, dec!(18000), dec!(200000));
    let items = b.service_charge
        + b.ground_rent
        + b.council_tax
        + b.insurance
        + b.gas_safety
        + b.management_fees
        + b.maintenance
        + b.electrical_certificate
        + b.epc_certificate
        + b.void_cost;
    assert_eq!(items, b.total);
    assert_eq!(b.management_fees, dec!(1800));
    assert_eq!(b.maintenance, dec!(1800));
    assert_eq!(b.electrical_certificate, dec!(45));
    assert_eq!(b.epc_certificate, dec!(10));
}

#[test]
fn test_maintenance_greater_of_bases() {
    let costs = CostProfile {
        maintenance: MaintenanceBasis::GreaterOf {
            value_pct: dec!(1),
            rent_pct: dec!(10),
        },
        ..CostProfile::default()
    };
    // 1% of 300k beats 10% of 18k
    let b = annual_operating_costs(&costs, dec!(18000), dec!(300000));
    assert_eq!(b.maintenance, dec!(3000));
}

#[test]
fn test_acquisition_total() {
    let costs = CostProfile {
        mortgage_product_fee: dec!(999),
        broker_fee_pct: dec!(1),
        ..CostProfile::default()
    };
    let a = acquisition_costs(dec!(200000), dec!(75), &costs, &StampDutySchedule::default())
        .unwrap();
    assert_eq!(a.loan_amount, dec!(150000));
    assert_eq!(a.deposit, dec!(50000));
    assert_eq!(a.stamp_duty, dec!(11500));
    assert_eq!(a.broker_fee, dec!(1500));
    assert_eq!(
        a.total,
        a.deposit + a.stamp_duty + a.legal_fees + a.survey_costs + a.mortgage_product_fee
            + a.broker_fee
    );
}
