use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PropInvestError;
use crate::types::{percent_of, Money, Percent};
use crate::PropInvestResult;

/// Electrical installation condition reports are renewed every five years.
const ELECTRICAL_CERT_YEARS: u32 = 5;
/// Energy performance certificates last ten years.
const EPC_CERT_YEARS: u32 = 10;
const DAYS_PER_YEAR: u32 = 365;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the annual maintenance provision is sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum MaintenanceBasis {
    /// Percentage of the property value
    PercentOfValue { pct: Percent },
    /// Percentage of the annual rent
    PercentOfRent { pct: Percent },
    /// The larger of the two provisions
    GreaterOf { value_pct: Percent, rent_pct: Percent },
}

impl Default for MaintenanceBasis {
    fn default() -> Self {
        MaintenanceBasis::PercentOfRent { pct: dec!(10) }
    }
}

impl MaintenanceBasis {
    /// Annual maintenance provision for the given rent and property value.
    pub fn provision(&self, annual_rent: Money, property_value: Money) -> Money {
        match self {
            MaintenanceBasis::PercentOfValue { pct } => percent_of(*pct, property_value),
            MaintenanceBasis::PercentOfRent { pct } => percent_of(*pct, annual_rent),
            MaintenanceBasis::GreaterOf { value_pct, rent_pct } => {
                percent_of(*value_pct, property_value).max(percent_of(*rent_pct, annual_rent))
            }
        }
    }
}

/// Recurring running costs and one-off purchase costs of a rental property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostProfile {
    /// Annual service charge (leasehold)
    pub service_charge: Money,
    /// Annual ground rent (leasehold)
    pub ground_rent: Money,
    /// Annual council tax borne by the landlord
    pub council_tax: Money,
    /// Annual landlord insurance
    pub insurance: Money,
    /// Annual gas safety certificate
    pub gas_safety: Money,
    /// Letting agent fee as a percentage of rent
    pub management_fee_pct: Percent,
    /// Maintenance provision rule
    pub maintenance: MaintenanceBasis,
    /// Electrical inspection cost, renewed every 5 years
    pub electrical_certificate: Money,
    /// EPC cost, renewed every 10 years
    pub epc_certificate: Money,
    /// Expected void days per year
    pub void_days: u32,
    /// Conveyancing fees
    pub legal_fees: Money,
    /// Survey / valuation fees
    pub survey_costs: Money,
    /// Lender arrangement fee
    pub mortgage_product_fee: Money,
    /// Broker fee as a percentage of the loan
    pub broker_fee_pct: Percent,
}

impl Default for CostProfile {
    fn default() -> Self {
        Self {
            service_charge: Decimal::ZERO,
            ground_rent: Decimal::ZERO,
            council_tax: Decimal::ZERO,
            insurance: dec!(200),
            gas_safety: dec!(80),
            management_fee_pct: dec!(10),
            maintenance: MaintenanceBasis::default(),
            electrical_certificate: dec!(225),
            epc_certificate: dec!(100),
            void_days: 21,
            legal_fees: dec!(2000),
            survey_costs: dec!(300),
            mortgage_product_fee: Decimal::ZERO,
            broker_fee_pct: Decimal::ZERO,
        }
    }
}

impl CostProfile {
    pub fn validate(&self) -> PropInvestResult<()> {
        let amounts = [
            ("service_charge", self.service_charge),
            ("ground_rent", self.ground_rent),
            ("council_tax", self.council_tax),
            ("insurance", self.insurance),
            ("gas_safety", self.gas_safety),
            ("electrical_certificate", self.electrical_certificate),
            ("epc_certificate", self.epc_certificate),
            ("legal_fees", self.legal_fees),
            ("survey_costs", self.survey_costs),
            ("mortgage_product_fee", self.mortgage_product_fee),
        ];
        for (field, amount) in amounts {
            if amount < Decimal::ZERO {
                return Err(PropInvestError::InvalidInput {
                    field: format!("costs.{field}"),
                    reason: "Cost cannot be negative".into(),
                });
            }
        }

        let pcts = [
            ("management_fee_pct", self.management_fee_pct),
            ("broker_fee_pct", self.broker_fee_pct),
        ];
        for (field, pct) in pcts {
            if pct < Decimal::ZERO || pct > dec!(100) {
                return Err(PropInvestError::InvalidInput {
                    field: format!("costs.{field}"),
                    reason: "Percentage must lie between 0 and 100".into(),
                });
            }
        }

        let maintenance_ok = match &self.maintenance {
            MaintenanceBasis::PercentOfValue { pct } | MaintenanceBasis::PercentOfRent { pct } => {
                *pct >= Decimal::ZERO
            }
            MaintenanceBasis::GreaterOf { value_pct, rent_pct } => {
                *value_pct >= Decimal::ZERO && *rent_pct >= Decimal::ZERO
            }
        };
        if !maintenance_ok {
            return Err(PropInvestError::InvalidInput {
                field: "costs.maintenance".into(),
                reason: "Maintenance percentage cannot be negative".into(),
            });
        }

        if self.void_days > DAYS_PER_YEAR {
            return Err(PropInvestError::InvalidInput {
                field: "costs.void_days".into(),
                reason: "Void days cannot exceed 365".into(),
            });
        }
        Ok(())
    }
}

/// Line-by-line annual operating costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCostBreakdown {
    pub service_charge: Money,
    pub ground_rent: Money,
    pub council_tax: Money,
    pub insurance: Money,
    pub gas_safety: Money,
    pub management_fees: Money,
    pub maintenance: Money,
    pub electrical_certificate: Money,
    pub epc_certificate: Money,
    pub void_cost: Money,
    pub total: Money,
}

/// One band of a tiered purchase tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampDutyBand {
    /// Price from which this band applies
    pub lower: Money,
    /// Price at which this band ends; `None` for an open top band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate_pct: Percent,
}

/// Tiered stamp duty schedule. Each band taxes the slice of the price that
/// falls inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampDutySchedule {
    pub bands: Vec<StampDutyBand>,
}

impl Default for StampDutySchedule {
    /// Residential rates for company purchases (5% higher-rates surcharge
    /// included), with the 15% and 17% bands above 925,000.
    fn default() -> Self {
        let band = |lower: Decimal, upper: Option<Decimal>, rate_pct: Decimal| StampDutyBand {
            lower,
            upper,
            rate_pct,
        };
        Self {
            bands: vec![
                band(Decimal::ZERO, Some(dec!(125000)), dec!(5)),
                band(dec!(125000), Some(dec!(250000)), dec!(7)),
                band(dec!(250000), Some(dec!(925000)), dec!(10)),
                band(dec!(925000), Some(dec!(1500000)), dec!(15)),
                band(dec!(1500000), None, dec!(17)),
            ],
        }
    }
}

impl StampDutySchedule {
    pub fn validate(&self) -> PropInvestResult<()> {
        let mut expected_lower = Decimal::ZERO;
        for (i, band) in self.bands.iter().enumerate() {
            if band.lower != expected_lower {
                return Err(PropInvestError::InvalidInput {
                    field: format!("stamp_duty.bands[{i}].lower"),
                    reason: format!("Band must start at {expected_lower} to follow the previous band"),
                });
            }
            if band.rate_pct < Decimal::ZERO || band.rate_pct > dec!(100) {
                return Err(PropInvestError::InvalidInput {
                    field: format!("stamp_duty.bands[{i}].rate_pct"),
                    reason: "Rate must lie between 0% and 100%".into(),
                });
            }
            match band.upper {
                Some(upper) if upper <= band.lower => {
                    return Err(PropInvestError::InvalidInput {
                        field: format!("stamp_duty.bands[{i}].upper"),
                        reason: "Band upper bound must exceed its lower bound".into(),
                    });
                }
                Some(upper) => expected_lower = upper,
                None if i + 1 < self.bands.len() => {
                    return Err(PropInvestError::InvalidInput {
                        field: format!("stamp_duty.bands[{i}].upper"),
                        reason: "Only the last band may be open-ended".into(),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Price above which no band applies, if the table is capped.
    pub fn ceiling(&self) -> Option<Money> {
        self.bands.last().and_then(|b| b.upper)
    }
}

/// Duty charged in one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampDutyBandCharge {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate_pct: Percent,
    pub taxable_amount: Money,
    pub duty: Money,
}

/// Stamp duty split by band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampDutyBreakdown {
    pub bands: Vec<StampDutyBandCharge>,
    pub total: Money,
    /// Portion of the price above a capped table, which no band taxes
    pub untaxed_excess: Money,
}

/// Cash needed to complete a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionCostBreakdown {
    pub loan_amount: Money,
    pub deposit: Money,
    pub stamp_duty: Money,
    pub legal_fees: Money,
    pub survey_costs: Money,
    pub mortgage_product_fee: Money,
    pub broker_fee: Money,
    pub total: Money,
}

fn default_loan_to_value() -> Percent {
    dec!(75)
}

/// A purchase to cost out, without the mortgage rate and term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCostsInput {
    pub property_price: Money,
    pub monthly_rent: Money,
    #[serde(default = "default_loan_to_value")]
    pub loan_to_value_pct: Percent,
    #[serde(default)]
    pub costs: CostProfile,
}

/// First-year running costs and completion costs of a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCosts {
    pub operating_costs: OperatingCostBreakdown,
    pub acquisition_costs: AcquisitionCostBreakdown,
    pub stamp_duty: StampDutyBreakdown,
}

// ---------------------------------------------------------------------------
// Operating costs
// ---------------------------------------------------------------------------

/// Annual running costs of the property for a given rent and value.
pub fn annual_operating_costs(
    costs: &CostProfile,
    annual_rent: Money,
    property_value: Money,
) -> OperatingCostBreakdown {
    let management_fees = percent_of(costs.management_fee_pct, annual_rent);
    let maintenance = costs.maintenance.provision(annual_rent, property_value);
    let electrical_certificate =
        costs.electrical_certificate / Decimal::from(ELECTRICAL_CERT_YEARS);
    let epc_certificate = costs.epc_certificate / Decimal::from(EPC_CERT_YEARS);
    let void_cost =
        Decimal::from(costs.void_days) / Decimal::from(DAYS_PER_YEAR) * annual_rent;

    let total = costs.service_charge
        + costs.ground_rent
        + costs.council_tax
        + costs.insurance
        + costs.gas_safety
        + management_fees
        + maintenance
        + electrical_certificate
        + epc_certificate
        + void_cost;

    OperatingCostBreakdown {
        service_charge: costs.service_charge,
        ground_rent: costs.ground_rent,
        council_tax: costs.council_tax,
        insurance: costs.insurance,
        gas_safety: costs.gas_safety,
        management_fees,
        maintenance,
        electrical_certificate,
        epc_certificate,
        void_cost,
        total,
    }
}

// ---------------------------------------------------------------------------
// Stamp duty
// ---------------------------------------------------------------------------

/// Stamp duty on `price`, band by band.
pub fn stamp_duty_breakdown(price: Money, schedule: &StampDutySchedule) -> StampDutyBreakdown {
    let price = price.max(Decimal::ZERO);
    let mut bands = Vec::with_capacity(schedule.bands.len());
    let mut total = Decimal::ZERO;

    for band in &schedule.bands {
        if price <= band.lower {
            break;
        }
        let top = match band.upper {
            Some(upper) => price.min(upper),
            None => price,
        };
        let taxable_amount = top - band.lower;
        let duty = percent_of(band.rate_pct, taxable_amount);
        total += duty;
        bands.push(StampDutyBandCharge {
            lower: band.lower,
            upper: band.upper,
            rate_pct: band.rate_pct,
            taxable_amount,
            duty,
        });
    }

    let untaxed_excess = match schedule.ceiling() {
        Some(ceiling) if price > ceiling => price - ceiling,
        _ => Decimal::ZERO,
    };

    StampDutyBreakdown {
        bands,
        total,
        untaxed_excess,
    }
}

/// Total stamp duty on `price`.
pub fn stamp_duty(price: Money, schedule: &StampDutySchedule) -> Money {
    stamp_duty_breakdown(price, schedule).total
}

// ---------------------------------------------------------------------------
// Acquisition costs
// ---------------------------------------------------------------------------

/// Up-front cash for buying at `price` with `loan_to_value_pct` borrowed:
/// deposit, stamp duty, legal, survey, product fee and broker fee.
pub fn acquisition_costs(
    price: Money,
    loan_to_value_pct: Percent,
    costs: &CostProfile,
    schedule: &StampDutySchedule,
) -> PropInvestResult<AcquisitionCostBreakdown> {
    if price < Decimal::ZERO {
        return Err(PropInvestError::InvalidInput {
            field: "property_price".into(),
            reason: "Property price cannot be negative".into(),
        });
    }
    if loan_to_value_pct < Decimal::ZERO || loan_to_value_pct > dec!(100) {
        return Err(PropInvestError::InvalidInput {
            field: "loan_to_value_pct".into(),
            reason: "Loan-to-value must lie between 0 and 100".into(),
        });
    }

    let loan_amount = percent_of(loan_to_value_pct, price);
    let deposit = price - loan_amount;
    let duty = stamp_duty(price, schedule);
    let broker_fee = percent_of(costs.broker_fee_pct, loan_amount);

    let total = deposit
        + duty
        + costs.legal_fees
        + costs.survey_costs
        + costs.mortgage_product_fee
        + broker_fee;

    Ok(AcquisitionCostBreakdown {
        loan_amount,
        deposit,
        stamp_duty: duty,
        legal_fees: costs.legal_fees,
        survey_costs: costs.survey_costs,
        mortgage_product_fee: costs.mortgage_product_fee,
        broker_fee,
        total,
    })
}

/// Running costs at the purchase price plus the cash needed to complete.
pub fn purchase_costs(
    input: &PurchaseCostsInput,
    schedule: &StampDutySchedule,
) -> PropInvestResult<PurchaseCosts> {
    input.costs.validate()?;
    let annual_rent = input.monthly_rent * Decimal::from(12);

    Ok(PurchaseCosts {
        operating_costs: annual_operating_costs(&input.costs, annual_rent, input.property_price),
        acquisition_costs: acquisition_costs(
            input.property_price,
            input.loan_to_value_pct,
            &input.costs,
            schedule,
        )?,
        stamp_duty: stamp_duty_breakdown(input.property_price, schedule),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_operating_costs() {
        // 18k rent: 200 + 80 + 1800 + 1800 + 45 + 10 + 21/365 * 18000
        let b = annual_operating_costs(&CostProfile::default(), dec!(18000), dec!(250000));
        assert_eq!(b.management_fees, dec!(1800));
        assert_eq!(b.maintenance, dec!(1800));
        assert_eq!(b.electrical_certificate, dec!(45));
        assert_eq!(b.epc_certificate, dec!(10));
        let expected = dec!(3935) + dec!(21) / dec!(365) * dec!(18000);
        assert!((b.total - expected).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_maintenance_percent_of_value() {
        let basis = MaintenanceBasis::PercentOfValue { pct: dec!(1) };
        assert_eq!(basis.provision(dec!(18000), dec!(250000)), dec!(2500));
    }

    #[test]
    fn test_maintenance_greater_of() {
        let basis = MaintenanceBasis::GreaterOf {
            value_pct: dec!(1),
            rent_pct: dec!(10),
        };
        assert_eq!(basis.provision(dec!(18000), dec!(100000)), dec!(1800));
        assert_eq!(basis.provision(dec!(18000), dec!(300000)), dec!(3000));
    }

    #[test]
    fn test_stamp_duty_first_band() {
        assert_eq!(stamp_duty(dec!(125000), &StampDutySchedule::default()), dec!(6250));
    }

    #[test]
    fn test_stamp_duty_three_bands() {
        let b = stamp_duty_breakdown(dec!(300000), &StampDutySchedule::default());
        assert_eq!(b.total, dec!(20000));
        assert_eq!(b.bands.len(), 3);
        assert_eq!(b.bands[2].taxable_amount, dec!(50000));
        assert_eq!(b.untaxed_excess, Decimal::ZERO);
    }

    #[test]
    fn test_stamp_duty_capped_table_reports_excess() {
        let mut schedule = StampDutySchedule::default();
        schedule.bands.truncate(3);
        let b = stamp_duty_breakdown(dec!(1000000), &schedule);
        assert_eq!(b.total, dec!(82500));
        assert_eq!(b.untaxed_excess, dec!(75000));
    }

    #[test]
    fn test_stamp_duty_open_top_band() {
        // 6,250 + 8,750 + 67,500 + 86,250 + 8,500
        let d = stamp_duty(dec!(1550000), &StampDutySchedule::default());
        assert_eq!(d, dec!(177250));
    }

    #[test]
    fn test_stamp_duty_zero_price() {
        assert_eq!(stamp_duty(Decimal::ZERO, &StampDutySchedule::default()), Decimal::ZERO);
    }

    #[test]
    fn test_schedule_validation_rejects_gap() {
        let schedule = StampDutySchedule {
            bands: vec![
                StampDutyBand { lower: Decimal::ZERO, upper: Some(dec!(100)), rate_pct: dec!(1) },
                StampDutyBand { lower: dec!(200), upper: None, rate_pct: dec!(2) },
            ],
        };
        assert!(schedule.validate().is_err());
        assert!(StampDutySchedule::default().validate().is_ok());
    }

    #[test]
    fn test_acquisition_costs() {
        let costs = CostProfile {
            broker_fee_pct: dec!(1),
            mortgage_product_fee: dec!(999),
            ..CostProfile::default()
        };
        let a = acquisition_costs(dec!(200000), dec!(75), &costs, &StampDutySchedule::default())
            .unwrap();
        assert_eq!(a.loan_amount, dec!(150000));
        assert_eq!(a.deposit, dec!(50000));
        assert_eq!(a.stamp_duty, dec!(11500));
        assert_eq!(a.broker_fee, dec!(1500));
        assert_eq!(a.total, dec!(50000) + dec!(11500) + dec!(2000) + dec!(300) + dec!(999) + dec!(1500));
    }

    #[test]
    fn test_purchase_costs_defaults_loan_to_value() {
        let input: PurchaseCostsInput =
            serde_json::from_str(r#"{ "property_price": "200000", "monthly_rent": "1500" }"#)
                .unwrap();
        assert_eq!(input.loan_to_value_pct, dec!(75));

        let out = purchase_costs(&input, &StampDutySchedule::default()).unwrap();
        assert_eq!(out.acquisition_costs.deposit, dec!(50000));
        assert_eq!(out.stamp_duty.total, out.acquisition_costs.stamp_duty);
        assert_eq!(out.operating_costs.management_fees, dec!(1800));
    }

    #[test]
    fn test_purchase_costs_rejects_invalid_profile() {
        let input = PurchaseCostsInput {
            property_price: dec!(200000),
            monthly_rent: dec!(1500),
            loan_to_value_pct: dec!(75),
            costs: CostProfile {
                void_days: 400,
                ..CostProfile::default()
            },
        };
        assert!(purchase_costs(&input, &StampDutySchedule::default()).is_err());
    }

    #[test]
    fn test_cost_profile_rejects_excess_void_days() {
        let costs = CostProfile {
            void_days: 400,
            ..CostProfile::default()
        };
        assert!(costs.validate().is_err());
    }
}
