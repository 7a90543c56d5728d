use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PropInvestError;
use crate::types::{percent_of, Money, Percent};
use crate::PropInvestResult;

/// Corporation tax bands with marginal relief between the two limits.
///
/// Profits at or below `small_profits_limit` pay the small profits rate,
/// profits at or above `upper_limit` pay the main rate, and in between the
/// effective rate rises linearly from one to the other and is applied to
/// the whole profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorporationTaxSchedule {
    pub small_profits_limit: Money,
    pub upper_limit: Money,
    pub small_profits_rate_pct: Percent,
    pub main_rate_pct: Percent,
}

impl Default for CorporationTaxSchedule {
    /// UK rates from April 2023.
    fn default() -> Self {
        Self {
            small_profits_limit: dec!(50000),
            upper_limit: dec!(250000),
            small_profits_rate_pct: dec!(19),
            main_rate_pct: dec!(25),
        }
    }
}

impl CorporationTaxSchedule {
    pub fn validate(&self) -> PropInvestResult<()> {
        if self.small_profits_limit < Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "corporation_tax.small_profits_limit".into(),
                reason: "Small profits limit cannot be negative".into(),
            });
        }
        if self.upper_limit <= self.small_profits_limit {
            return Err(PropInvestError::InvalidInput {
                field: "corporation_tax.upper_limit".into(),
                reason: "Upper limit must exceed the small profits limit".into(),
            });
        }
        if self.small_profits_rate_pct < Decimal::ZERO || self.main_rate_pct > dec!(100) {
            return Err(PropInvestError::InvalidInput {
                field: "corporation_tax.rates".into(),
                reason: "Tax rates must lie between 0% and 100%".into(),
            });
        }
        if self.main_rate_pct < self.small_profits_rate_pct {
            return Err(PropInvestError::InvalidInput {
                field: "corporation_tax.main_rate_pct".into(),
                reason: "Main rate cannot be below the small profits rate".into(),
            });
        }
        Ok(())
    }

    /// Effective rate applied to the whole of `profit`.
    pub fn effective_rate_pct(&self, profit: Money) -> Percent {
        if profit <= Decimal::ZERO {
            Decimal::ZERO
        } else if profit <= self.small_profits_limit {
            self.small_profits_rate_pct
        } else if profit >= self.upper_limit {
            self.main_rate_pct
        } else {
            let span = self.upper_limit - self.small_profits_limit;
            let rate_gap = self.main_rate_pct - self.small_profits_rate_pct;
            self.small_profits_rate_pct + (profit - self.small_profits_limit) * rate_gap / span
        }
    }
}

/// Tax due on one year's taxable profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxAssessment {
    /// Profit the tax is charged on (negative profit is clamped to zero)
    pub taxable_profit: Money,
    pub tax: Money,
    pub effective_rate_pct: Percent,
}

/// Corporation tax on `taxable_profit`. Losses pay no tax and are not
/// carried forward.
pub fn corporation_tax(taxable_profit: Money, schedule: &CorporationTaxSchedule) -> TaxAssessment {
    let taxable = taxable_profit.max(Decimal::ZERO);
    let effective_rate_pct = schedule.effective_rate_pct(taxable);

    TaxAssessment {
        taxable_profit: taxable,
        tax: percent_of(effective_rate_pct, taxable),
        effective_rate_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_small_profits_rate() {
        let t = corporation_tax(dec!(40000), &CorporationTaxSchedule::default());
        assert_eq!(t.tax, dec!(7600));
        assert_eq!(t.effective_rate_pct, dec!(19));
    }

    #[test]
    fn test_main_rate() {
        let t = corporation_tax(dec!(300000), &CorporationTaxSchedule::default());
        assert_eq!(t.tax, dec!(75000));
        assert_eq!(t.effective_rate_pct, dec!(25));
    }

    #[test]
    fn test_marginal_band_applies_to_whole_profit() {
        // 150k: 19 + 100k * 6 / 200k = 22%
        let t = corporation_tax(dec!(150000), &CorporationTaxSchedule::default());
        assert_eq!(t.effective_rate_pct, dec!(22));
        assert_eq!(t.tax, dec!(33000));
    }

    #[test]
    fn test_loss_pays_no_tax() {
        let t = corporation_tax(dec!(-5000), &CorporationTaxSchedule::default());
        assert_eq!(t.tax, Decimal::ZERO);
        assert_eq!(t.taxable_profit, Decimal::ZERO);
        assert_eq!(t.effective_rate_pct, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_schedule() {
        let schedule = CorporationTaxSchedule {
            upper_limit: dec!(10000),
            ..CorporationTaxSchedule::default()
        };
        assert!(schedule.validate().is_err());
    }
}
