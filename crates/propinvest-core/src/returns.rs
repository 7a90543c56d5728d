use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{self, LoanTerms};
use crate::config::PolicyConfig;
use crate::costs::{
    acquisition_costs, annual_operating_costs, stamp_duty_breakdown, AcquisitionCostBreakdown,
    CostProfile, OperatingCostBreakdown,
};
use crate::error::PropInvestError;
use crate::tax::{corporation_tax, TaxAssessment};
use crate::types::{percent_of, with_metadata, ComputationOutput, Money, Percent};
use crate::PropInvestResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Longest projection horizon accepted.
pub const MAX_HORIZON_YEARS: u32 = 200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Mortgage terms expressed relative to the purchase price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Financing {
    /// Share of the price borrowed, in percent
    pub loan_to_value_pct: Percent,
    /// Nominal annual mortgage rate, in percent
    pub annual_rate_pct: Percent,
    pub term_years: u32,
}

impl Default for Financing {
    fn default() -> Self {
        Self {
            loan_to_value_pct: dec!(75),
            annual_rate_pct: dec!(4.5),
            term_years: 25,
        }
    }
}

impl Financing {
    pub fn validate(&self) -> PropInvestResult<()> {
        if self.loan_to_value_pct < Decimal::ZERO || self.loan_to_value_pct > dec!(100) {
            return Err(PropInvestError::InvalidInput {
                field: "financing.loan_to_value_pct".into(),
                reason: "Loan-to-value must lie between 0 and 100".into(),
            });
        }
        LoanTerms {
            principal: Decimal::ZERO,
            annual_rate_pct: self.annual_rate_pct,
            term_years: self.term_years,
        }
        .validate()
    }

    /// Loan taken out to buy at `price`.
    pub fn loan_terms(&self, price: Money) -> LoanTerms {
        LoanTerms {
            principal: percent_of(self.loan_to_value_pct, price),
            annual_rate_pct: self.annual_rate_pct,
            term_years: self.term_years,
        }
    }
}

fn default_horizon_years() -> u32 {
    10
}

/// A single buy-to-let purchase. Never mutated: price changes produce a new
/// scenario through [`InvestmentScenario::with_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentScenario {
    pub property_price: Money,
    pub monthly_rent: Money,
    #[serde(default)]
    pub financing: Financing,
    #[serde(default)]
    pub costs: CostProfile,
    /// Annual capital growth of the property, in percent
    #[serde(default)]
    pub appreciation_rate_pct: Percent,
    /// Years covered by the multi-year projection
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,
}

impl InvestmentScenario {
    pub fn validate(&self) -> PropInvestResult<()> {
        if self.property_price <= Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "property_price".into(),
                reason: "Property price must be positive".into(),
            });
        }
        if self.monthly_rent <= Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "monthly_rent".into(),
                reason: "Monthly rent must be positive".into(),
            });
        }
        if self.appreciation_rate_pct <= dec!(-100) {
            return Err(PropInvestError::InvalidInput {
                field: "appreciation_rate_pct".into(),
                reason: "Appreciation must be greater than -100%".into(),
            });
        }
        if self.horizon_years > MAX_HORIZON_YEARS {
            return Err(PropInvestError::InvalidInput {
                field: "horizon_years".into(),
                reason: format!("Horizon cannot exceed {MAX_HORIZON_YEARS} years"),
            });
        }
        self.financing.validate()?;
        self.costs.validate()
    }

    pub fn annual_rent(&self) -> Money {
        self.monthly_rent * Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn loan_terms(&self) -> LoanTerms {
        self.financing.loan_terms(self.property_price)
    }

    /// The same scenario bought at a different price.
    pub fn with_price(&self, price: Money) -> Self {
        Self {
            property_price: price,
            ..self.clone()
        }
    }

    /// Market value after `years` of appreciation.
    pub fn property_value_at(&self, years: u32) -> PropInvestResult<Money> {
        let growth = Decimal::ONE + self.appreciation_rate_pct / dec!(100);
        growth
            .checked_powi(years as i64)
            .and_then(|factor| self.property_price.checked_mul(factor))
            .ok_or_else(|| PropInvestError::InvalidInput {
                field: "appreciation_rate_pct".into(),
                reason: format!(
                    "Property value after {years} years at {}% overflows",
                    self.appreciation_rate_pct
                ),
            })
    }
}

/// Income, cost and return figures for one year of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub year: u32,
    pub property_price: Money,
    pub annual_rent: Money,
    pub loan_amount: Money,
    pub monthly_mortgage_payment: Money,
    pub annual_mortgage_payment: Money,
    pub mortgage_interest: Money,
    /// Capital repaid in the year; builds equity rather than being a cost
    pub mortgage_principal: Money,
    pub operating_costs: OperatingCostBreakdown,
    pub acquisition_costs: AcquisitionCostBreakdown,
    /// Rent less operating costs and interest
    pub profit_before_tax: Money,
    pub tax: TaxAssessment,
    pub net_income_after_tax: Money,
    /// Net income after tax plus capital repaid
    pub net_income_after_tax_with_equity: Money,
    pub net_rental_yield_pct: Percent,
    pub cash_on_cash_return_pct: Percent,
    pub monthly_net_cash_flow: Money,
    pub break_even_occupancy_pct: Percent,
    /// Monthly rent less the monthly mortgage payment, before other costs
    pub monthly_rent_surplus: Money,
    pub rent_covers_mortgage: bool,
}

// ---------------------------------------------------------------------------
// Metric formulas
// ---------------------------------------------------------------------------

/// `(rent - operating costs - interest + principal) / price * 100`
pub fn net_rental_yield(
    annual_rent: Money,
    operating_costs: Money,
    interest: Money,
    principal: Money,
    property_price: Money,
) -> PropInvestResult<Percent> {
    if property_price <= Decimal::ZERO {
        return Err(PropInvestError::InvalidInput {
            field: "property_price".into(),
            reason: "Property price must be positive to compute a yield".into(),
        });
    }
    Ok((annual_rent - operating_costs - interest + principal) / property_price * dec!(100))
}

/// `(net income after tax + principal) / total acquisition cost * 100`
pub fn cash_on_cash_return(
    net_income_after_tax: Money,
    principal: Money,
    total_acquisition_cost: Money,
) -> PropInvestResult<Percent> {
    if total_acquisition_cost.is_zero() {
        return Err(PropInvestError::DivisionByZero {
            context: "cash-on-cash return (total acquisition cost)".into(),
        });
    }
    Ok((net_income_after_tax + principal) / total_acquisition_cost * dec!(100))
}

/// Cash left each month after tax and the full mortgage payment.
pub fn monthly_net_cash_flow(net_income_after_tax: Money, principal: Money) -> Money {
    (net_income_after_tax - principal) / Decimal::from(MONTHS_PER_YEAR)
}

/// Share of the year the property must be let to cover costs and interest.
pub fn break_even_occupancy(
    operating_costs: Money,
    interest: Money,
    annual_rent: Money,
) -> PropInvestResult<Percent> {
    if annual_rent <= Decimal::ZERO {
        return Err(PropInvestError::InvalidInput {
            field: "annual_rent".into(),
            reason: "Rent must be positive to compute break-even occupancy".into(),
        });
    }
    Ok((operating_costs + interest) / annual_rent * dec!(100))
}

/// One-year return on the equity held at the start of the year:
/// `((equity - previous equity) + rent - cost) / previous equity * 100`.
pub fn year_over_year_return(
    previous_equity: Money,
    equity: Money,
    annual_rent: Money,
    annual_cost: Money,
) -> PropInvestResult<Percent> {
    if previous_equity.is_zero() {
        return Err(PropInvestError::UndefinedMetric {
            metric: "year_over_year_return".into(),
            reason: "previous equity is zero".into(),
        });
    }
    Ok(((equity - previous_equity) + annual_rent - annual_cost) / previous_equity * dec!(100))
}

// ---------------------------------------------------------------------------
// Scenario evaluation
// ---------------------------------------------------------------------------

/// Compute every return metric for loan year `year` of the scenario.
///
/// Operating costs use the property value at the start of the year; yields
/// are measured against the purchase price.
pub fn compute_metrics(
    scenario: &InvestmentScenario,
    policy: &PolicyConfig,
    year: u32,
) -> PropInvestResult<ReturnMetrics> {
    if year == 0 {
        return Err(PropInvestError::InvalidInput {
            field: "year".into(),
            reason: "Years are numbered from 1".into(),
        });
    }
    scenario.validate()?;

    let annual_rent = scenario.annual_rent();
    let loan = scenario.loan_terms();
    let monthly_mortgage_payment = amortization::monthly_payment(&loan)?;
    let annual_mortgage_payment = monthly_mortgage_payment * Decimal::from(MONTHS_PER_YEAR);
    let split = amortization::year_interest_principal(&loan, year)?;

    let operating_costs = annual_operating_costs(
        &scenario.costs,
        annual_rent,
        scenario.property_value_at(year - 1)?,
    );
    let acquisition = acquisition_costs(
        scenario.property_price,
        scenario.financing.loan_to_value_pct,
        &scenario.costs,
        &policy.stamp_duty,
    )?;

    let profit_before_tax = annual_rent - operating_costs.total - split.interest;
    let tax = corporation_tax(profit_before_tax, &policy.corporation_tax);
    let net_income_after_tax = profit_before_tax - tax.tax;

    let net_rental_yield_pct = net_rental_yield(
        annual_rent,
        operating_costs.total,
        split.interest,
        split.principal,
        scenario.property_price,
    )?;
    let cash_on_cash_return_pct =
        cash_on_cash_return(net_income_after_tax, split.principal, acquisition.total)?;
    let break_even_occupancy_pct =
        break_even_occupancy(operating_costs.total, split.interest, annual_rent)?;

    // Payments stop once the term has run.
    let payment_in_year = if year > loan.term_years {
        Decimal::ZERO
    } else {
        annual_mortgage_payment
    };

    Ok(ReturnMetrics {
        year,
        property_price: scenario.property_price,
        annual_rent,
        loan_amount: loan.principal,
        monthly_mortgage_payment,
        annual_mortgage_payment,
        mortgage_interest: split.interest,
        mortgage_principal: split.principal,
        operating_costs,
        acquisition_costs: acquisition,
        profit_before_tax,
        tax,
        net_income_after_tax,
        net_income_after_tax_with_equity: net_income_after_tax + split.principal,
        net_rental_yield_pct,
        cash_on_cash_return_pct,
        monthly_net_cash_flow: monthly_net_cash_flow(net_income_after_tax, split.principal),
        break_even_occupancy_pct,
        monthly_rent_surplus: (annual_rent - payment_in_year) / Decimal::from(MONTHS_PER_YEAR),
        rent_covers_mortgage: annual_rent > payment_in_year,
    })
}

/// Evaluate a scenario for one loan year, wrapped in the standard envelope
/// with warnings for weak or risky positions.
pub fn evaluate_scenario(
    scenario: &InvestmentScenario,
    policy: &PolicyConfig,
    year: u32,
) -> PropInvestResult<ComputationOutput<ReturnMetrics>> {
    let start = Instant::now();
    policy.validate()?;

    let metrics = compute_metrics(scenario, policy, year)?;
    let warnings = metric_warnings(scenario, policy, &metrics);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Company Buy-to-Let Return Metrics (accurate amortization, UK corporation tax)",
        &serde_json::json!({
            "scenario": scenario,
            "year": year,
            "policy": policy,
        }),
        warnings,
        elapsed,
        metrics,
    ))
}

fn metric_warnings(
    scenario: &InvestmentScenario,
    policy: &PolicyConfig,
    metrics: &ReturnMetrics,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if !metrics.rent_covers_mortgage {
        warnings.push(format!(
            "Annual rent {} does not cover the annual mortgage payment {}",
            metrics.annual_rent.round_dp(2),
            metrics.annual_mortgage_payment.round_dp(2)
        ));
    }
    if metrics.monthly_net_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Negative monthly cash flow of {}: the company must fund the shortfall",
            metrics.monthly_net_cash_flow.round_dp(2)
        ));
    }
    if scenario.financing.loan_to_value_pct > dec!(80) {
        warnings.push(format!(
            "LTV of {}% exceeds 80%: high leverage",
            scenario.financing.loan_to_value_pct
        ));
    }
    if metrics.year > scenario.financing.term_years {
        warnings.push(format!(
            "Year {} is after the {}-year mortgage term; no mortgage payments remain",
            metrics.year, scenario.financing.term_years
        ));
    }
    let duty = stamp_duty_breakdown(scenario.property_price, &policy.stamp_duty);
    if duty.untaxed_excess > Decimal::ZERO {
        warnings.push(format!(
            "Stamp duty table ends below the price; {} of the price is untaxed",
            duty.untaxed_excess
        ));
    }

    warnings
}
