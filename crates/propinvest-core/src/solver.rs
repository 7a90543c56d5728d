use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::annual_payment;
use crate::config::{PolicyConfig, SolverConfig};
use crate::costs::CostProfile;
use crate::error::PropInvestError;
use crate::returns::{compute_metrics, Financing, InvestmentScenario, ReturnMetrics};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::PropInvestResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Return metric the solver matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMetric {
    NetRentalYield,
    CashOnCashReturn,
}

impl TargetMetric {
    pub fn value(&self, metrics: &ReturnMetrics) -> Percent {
        match self {
            TargetMetric::NetRentalYield => metrics.net_rental_yield_pct,
            TargetMetric::CashOnCashReturn => metrics.cash_on_cash_return_pct,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetMetric::NetRentalYield => "net rental yield",
            TargetMetric::CashOnCashReturn => "cash-on-cash return",
        }
    }
}

/// Everything about a purchase except its price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairPriceInput {
    pub monthly_rent: Money,
    #[serde(default)]
    pub financing: Financing,
    #[serde(default)]
    pub costs: CostProfile,
    #[serde(default)]
    pub appreciation_rate_pct: Percent,
    pub target: TargetMetric,
    /// Desired value of the target metric, in percent
    pub target_value_pct: Percent,
    /// Cap on monthly net cash flow; prices below the point where cash flow
    /// falls to the cap are excluded
    #[serde(default)]
    pub max_monthly_cash_flow: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverPhase {
    FeasibilityCeiling,
    CashFlowFloor,
    TargetSearch,
}

/// One evaluated candidate price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverIteration {
    pub phase: SolverPhase,
    pub iteration: u32,
    pub lower: Money,
    pub upper: Money,
    pub candidate: Money,
    /// Rent surplus over the mortgage, monthly cash flow or target metric,
    /// depending on the phase
    pub value: Decimal,
}

/// What stopped the price from going higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingConstraint {
    /// The price where the metric meets its target
    Target,
    /// The metric still exceeds the target at the highest price the rent
    /// can carry
    RentCoverage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub name: String,
    pub satisfied: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairPriceOutput {
    pub fair_price: Money,
    pub target: TargetMetric,
    pub target_value_pct: Percent,
    pub achieved_value_pct: Percent,
    pub net_rental_yield_pct: Percent,
    pub cash_on_cash_return_pct: Percent,
    pub monthly_net_cash_flow: Money,
    /// Highest price at which rent exceeds the mortgage payment
    pub feasibility_ceiling: Money,
    /// Lowest price meeting the cash flow cap, when one is set
    pub cash_flow_floor: Option<Money>,
    pub binding_constraint: BindingConstraint,
    pub metrics: ReturnMetrics,
    pub constraints: Vec<ConstraintCheck>,
    pub iterations: Vec<SolverIteration>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Find the highest price at which the chosen metric reaches its target,
/// subject to rent covering the mortgage and the optional cash flow cap.
pub fn solve_fair_price(
    input: &FairPriceInput,
    policy: &PolicyConfig,
) -> PropInvestResult<ComputationOutput<FairPriceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    policy.validate()?;
    validate_input(input)?;

    let solver = &policy.solver;
    let base = InvestmentScenario {
        property_price: solver.min_price,
        monthly_rent: input.monthly_rent,
        financing: input.financing.clone(),
        costs: input.costs.clone(),
        appreciation_rate_pct: input.appreciation_rate_pct,
        horizon_years: 1,
    };
    base.validate()?;

    let mut trace: Vec<SolverIteration> = Vec::new();

    let feasibility_ceiling = find_feasibility_ceiling(&base, solver, &mut trace)?;
    info!("rent coverage ceiling at {}", feasibility_ceiling.round_dp(2));

    let cash_flow_floor = match input.max_monthly_cash_flow {
        Some(cap) => {
            let floor = find_cash_flow_floor(&base, policy, cap, &mut trace)?;
            if floor > feasibility_ceiling {
                return Err(PropInvestError::InfeasibleConstraint(format!(
                    "cash flow falls to {cap} only at {}, above the rent coverage ceiling {}",
                    floor.round_dp(2),
                    feasibility_ceiling.round_dp(2)
                )));
            }
            info!("cash flow floor at {}", floor.round_dp(2));
            Some(floor)
        }
        None => None,
    };

    let lower = cash_flow_floor.unwrap_or(solver.min_price);
    let (fair_price, binding_constraint) =
        match_target(&base, policy, input, lower, feasibility_ceiling, &mut trace)?;
    info!(
        "fair price {} ({:?})",
        fair_price.round_dp(2),
        binding_constraint
    );

    let metrics = compute_metrics(&base.with_price(fair_price), policy, 1)?;
    let achieved_value_pct = input.target.value(&metrics);

    if binding_constraint == BindingConstraint::RentCoverage {
        warnings.push(format!(
            "Target {} of {}% exceeded at every affordable price; price capped by rent coverage (achieved {}%)",
            input.target.label(),
            input.target_value_pct,
            achieved_value_pct.round_dp(2)
        ));
    }
    if metrics.monthly_net_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Negative monthly cash flow of {} at the fair price",
            metrics.monthly_net_cash_flow.round_dp(2)
        ));
    }
    if feasibility_ceiling >= solver.max_price {
        warnings.push(format!(
            "Rent covers the mortgage up to the search limit {}; raise solver.max_price to widen the search",
            solver.max_price
        ));
    }

    let constraints = constraint_checks(input, &metrics, binding_constraint);

    let output = FairPriceOutput {
        fair_price,
        target: input.target,
        target_value_pct: input.target_value_pct,
        achieved_value_pct,
        net_rental_yield_pct: metrics.net_rental_yield_pct,
        cash_on_cash_return_pct: metrics.cash_on_cash_return_pct,
        monthly_net_cash_flow: metrics.monthly_net_cash_flow,
        feasibility_ceiling,
        cash_flow_floor,
        binding_constraint,
        metrics,
        constraints,
        iterations: trace,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fair Price Search (bisection under rent coverage and cash flow constraints)",
        &serde_json::json!({
            "input": input,
            "solver": solver,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &FairPriceInput) -> PropInvestResult<()> {
    if input.monthly_rent <= Decimal::ZERO {
        return Err(PropInvestError::InvalidInput {
            field: "monthly_rent".into(),
            reason: "Monthly rent must be positive".into(),
        });
    }
    if input.target_value_pct <= dec!(-100) {
        return Err(PropInvestError::InvalidInput {
            field: "target_value_pct".into(),
            reason: "Target must be greater than -100%".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Search phases
// ---------------------------------------------------------------------------

/// Bisect `[lower, upper]` where `holds(lower)` is true and `holds(upper)`
/// is false, until the bracket is no wider than the price tolerance.
fn bisect_boundary<F>(
    phase: SolverPhase,
    mut lower: Money,
    mut upper: Money,
    solver: &SolverConfig,
    trace: &mut Vec<SolverIteration>,
    mut evaluate: F,
) -> PropInvestResult<(Money, Money)>
where
    F: FnMut(Money) -> PropInvestResult<(bool, Decimal)>,
{
    let mut iteration = 0u32;
    while upper - lower > solver.price_tolerance {
        if iteration >= solver.max_iterations {
            return Err(PropInvestError::NotConverged {
                function: format!("solve_fair_price ({phase:?})"),
                iterations: iteration,
                last_delta: upper - lower,
            });
        }
        iteration += 1;

        let candidate = (lower + upper) / dec!(2);
        let (holds, value) = evaluate(candidate)?;
        debug!("{phase:?} #{iteration}: [{lower}, {upper}] candidate {candidate} -> {value}");
        trace.push(SolverIteration {
            phase,
            iteration,
            lower,
            upper,
            candidate,
            value,
        });

        if holds {
            lower = candidate;
        } else {
            upper = candidate;
        }
    }
    Ok((lower, upper))
}

/// Annual rent less the annual mortgage payment at `price`.
fn rent_surplus(base: &InvestmentScenario, price: Money) -> PropInvestResult<Decimal> {
    let payment = annual_payment(&base.financing.loan_terms(price))?;
    Ok(base.annual_rent() - payment)
}

/// Highest price at which rent still exceeds the mortgage payment.
fn find_feasibility_ceiling(
    base: &InvestmentScenario,
    solver: &SolverConfig,
    trace: &mut Vec<SolverIteration>,
) -> PropInvestResult<Money> {
    let at_min = rent_surplus(base, solver.min_price)?;
    if at_min <= Decimal::ZERO {
        return Err(PropInvestError::InfeasibleConstraint(format!(
            "rent of {} a year does not cover the mortgage even at the minimum price {}",
            base.annual_rent(),
            solver.min_price
        )));
    }
    if rent_surplus(base, solver.max_price)? > Decimal::ZERO {
        return Ok(solver.max_price);
    }

    let (ceiling, _) = bisect_boundary(
        SolverPhase::FeasibilityCeiling,
        solver.min_price,
        solver.max_price,
        solver,
        trace,
        |price| {
            let surplus = rent_surplus(base, price)?;
            Ok((surplus > Decimal::ZERO, surplus))
        },
    )?;
    Ok(ceiling)
}

/// Lowest price at which monthly net cash flow is at or below `cap`.
fn find_cash_flow_floor(
    base: &InvestmentScenario,
    policy: &PolicyConfig,
    cap: Money,
    trace: &mut Vec<SolverIteration>,
) -> PropInvestResult<Money> {
    let solver = &policy.solver;
    let cash_flow = |price: Money| -> PropInvestResult<Money> {
        Ok(compute_metrics(&base.with_price(price), policy, 1)?.monthly_net_cash_flow)
    };

    let at_max = cash_flow(solver.max_price)?;
    if at_max > cap {
        return Err(PropInvestError::InfeasibleConstraint(format!(
            "monthly cash flow is still {} at the maximum price {}, above the cap {cap}",
            at_max.round_dp(2),
            solver.max_price
        )));
    }
    if cash_flow(solver.min_price)? <= cap {
        return Ok(solver.min_price);
    }

    let (_, floor) = bisect_boundary(
        SolverPhase::CashFlowFloor,
        solver.min_price,
        solver.max_price,
        solver,
        trace,
        |price| {
            let value = cash_flow(price)?;
            Ok((value > cap, value))
        },
    )?;
    Ok(floor)
}

/// Bisect `[lower, upper]` for the price where the target metric meets its
/// target. The metric falls as the price rises.
fn match_target(
    base: &InvestmentScenario,
    policy: &PolicyConfig,
    input: &FairPriceInput,
    lower: Money,
    upper: Money,
    trace: &mut Vec<SolverIteration>,
) -> PropInvestResult<(Money, BindingConstraint)> {
    let solver = &policy.solver;
    let target = input.target_value_pct;
    let tolerance = solver.metric_tolerance_pct;
    let metric = |price: Money| -> PropInvestResult<Percent> {
        let metrics = compute_metrics(&base.with_price(price), policy, 1)?;
        Ok(input.target.value(&metrics))
    };

    let at_upper = metric(upper)?;
    if (at_upper - target).abs() < tolerance {
        return Ok((upper, BindingConstraint::Target));
    }
    if at_upper > target {
        return Ok((upper, BindingConstraint::RentCoverage));
    }

    let at_lower = metric(lower)?;
    if (at_lower - target).abs() < tolerance {
        return Ok((lower, BindingConstraint::Target));
    }
    if at_lower < target {
        return Err(PropInvestError::InfeasibleConstraint(format!(
            "{} is {}% at the lowest admissible price {}, below the target {target}%",
            input.target.label(),
            at_lower.round_dp(2),
            lower.round_dp(2)
        )));
    }

    let (mut lo, mut hi) = (lower, upper);
    let mut last_delta = at_lower - target;
    for iteration in 1..=solver.max_iterations {
        let candidate = ((lo + hi) / dec!(2)).round_dp(2);
        let value = metric(candidate)?;
        debug!("TargetSearch #{iteration}: [{lo}, {hi}] candidate {candidate} -> {value}%");
        trace.push(SolverIteration {
            phase: SolverPhase::TargetSearch,
            iteration,
            lower: lo,
            upper: hi,
            candidate,
            value,
        });

        last_delta = value - target;
        if last_delta.abs() < tolerance {
            return Ok((candidate, BindingConstraint::Target));
        }
        if value > target {
            lo = candidate;
        } else {
            hi = candidate;
        }
    }

    Err(PropInvestError::NotConverged {
        function: "solve_fair_price".into(),
        iterations: solver.max_iterations,
        last_delta,
    })
}

fn constraint_checks(
    input: &FairPriceInput,
    metrics: &ReturnMetrics,
    binding: BindingConstraint,
) -> Vec<ConstraintCheck> {
    let mut checks = vec![
        ConstraintCheck {
            name: "rent_covers_mortgage".into(),
            satisfied: metrics.rent_covers_mortgage,
            detail: format!(
                "rent {} vs mortgage {} a year",
                metrics.annual_rent.round_dp(2),
                metrics.annual_mortgage_payment.round_dp(2)
            ),
        },
        ConstraintCheck {
            name: "target_met".into(),
            satisfied: binding == BindingConstraint::Target,
            detail: format!(
                "{} {}% vs target {}%",
                input.target.label(),
                input.target.value(metrics).round_dp(2),
                input.target_value_pct
            ),
        },
    ];
    if let Some(cap) = input.max_monthly_cash_flow {
        checks.push(ConstraintCheck {
            name: "cash_flow_cap".into(),
            satisfied: metrics.monthly_net_cash_flow <= cap,
            detail: format!(
                "monthly cash flow {} vs cap {cap}",
                metrics.monthly_net_cash_flow.round_dp(2)
            ),
        });
    }
    checks
}
