use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::PropInvestError;
use crate::types::{Money, Percent};
use crate::PropInvestResult;

/// Growth factor `(1 + r)^n` for a per-period rate `r`.
///
/// Fails with `InvalidInput` when the factor leaves the `Decimal` range.
pub fn compound_factor(period_rate: Decimal, periods: u32) -> PropInvestResult<Decimal> {
    (Decimal::ONE + period_rate)
        .checked_powi(periods as i64)
        .ok_or_else(|| overflow("periods", format!("(1 + {period_rate})^{periods}")))
}

fn overflow(field: &str, expr: String) -> PropInvestError {
    PropInvestError::InvalidInput {
        field: field.into(),
        reason: format!("{expr} overflows the decimal range"),
    }
}

/// Level payment that repays `principal` over `periods` at `period_rate`:
/// `P * r(1+r)^n / ((1+r)^n - 1)`, or `P / n` when the rate is zero.
pub fn annuity_payment(
    principal: Money,
    period_rate: Decimal,
    periods: u32,
) -> PropInvestResult<Money> {
    if periods == 0 {
        return Err(PropInvestError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if period_rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let factor = compound_factor(period_rate, periods)?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(PropInvestError::DivisionByZero {
            context: "annuity payment denominator".into(),
        });
    }

    (principal * period_rate)
        .checked_mul(factor)
        .map(|scaled| scaled / denominator)
        .ok_or_else(|| overflow("principal", "annuity payment".into()))
}

/// Present value of `periods` level payments: `pmt * (1 - (1+r)^-n) / r`.
pub fn annuity_present_value(
    payment: Money,
    period_rate: Decimal,
    periods: u32,
) -> PropInvestResult<Money> {
    if periods == 0 {
        return Ok(Decimal::ZERO);
    }

    if period_rate.is_zero() {
        return Ok(payment * Decimal::from(periods));
    }

    let factor = compound_factor(period_rate, periods)?;
    if factor.is_zero() {
        return Err(PropInvestError::DivisionByZero {
            context: "annuity present value factor".into(),
        });
    }

    Ok(payment * (Decimal::ONE - Decimal::ONE / factor) / period_rate)
}

/// Outstanding balance after `elapsed` payments, closed form:
/// `P(1+r)^k - pmt((1+r)^k - 1) / r`.
pub fn balance_after_periods(
    principal: Money,
    payment: Money,
    period_rate: Decimal,
    elapsed: u32,
) -> PropInvestResult<Money> {
    if period_rate.is_zero() {
        return Ok(principal - payment * Decimal::from(elapsed));
    }

    let factor = compound_factor(period_rate, elapsed)?;
    let grown = principal
        .checked_mul(factor)
        .ok_or_else(|| overflow("principal", "accumulated balance".into()))?;
    let repaid = payment
        .checked_mul(factor - Decimal::ONE)
        .ok_or_else(|| overflow("payment", "accumulated repayments".into()))?;
    Ok(grown - repaid / period_rate)
}

/// Compound annual growth rate in percent:
/// `((final / initial)^(1/years) - 1) * 100`.
///
/// A negative final value has no real fractional root and is reported as
/// `UndefinedMetric` rather than producing a meaningless number.
pub fn cagr(initial: Money, final_value: Money, years: u32) -> PropInvestResult<Percent> {
    if years == 0 {
        return Err(PropInvestError::InvalidInput {
            field: "years".into(),
            reason: "CAGR requires at least 1 year".into(),
        });
    }
    if initial <= Decimal::ZERO {
        return Err(PropInvestError::InvalidInput {
            field: "initial".into(),
            reason: "Initial investment must be positive for CAGR".into(),
        });
    }
    if final_value < Decimal::ZERO {
        return Err(PropInvestError::UndefinedMetric {
            metric: "cagr".into(),
            reason: format!("final value {final_value} is negative"),
        });
    }
    if final_value.is_zero() {
        return Ok(dec!(-100));
    }

    let ratio = final_value / initial;
    let exponent = Decimal::ONE / Decimal::from(years);
    let growth = ratio
        .checked_powd(exponent)
        .ok_or_else(|| PropInvestError::UndefinedMetric {
            metric: "cagr".into(),
            reason: format!("cannot raise {ratio} to 1/{years}"),
        })?;

    Ok((growth - Decimal::ONE) * dec!(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_annuity_payment_basic() {
        // 100,000 over 10 annual periods at 8%: ~14,902.95
        let result = annuity_payment(dec!(100000), dec!(0.08), 10).unwrap();
        assert!((result - dec!(14902.95)).abs() < dec!(0.01));
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let result = annuity_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(result, dec!(100));
    }

    #[test]
    fn test_annuity_payment_zero_periods() {
        assert!(annuity_payment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_present_value_inverts_payment() {
        let pmt = annuity_payment(dec!(250000), dec!(0.004), 240).unwrap();
        let pv = annuity_present_value(pmt, dec!(0.004), 240).unwrap();
        assert!((pv - dec!(250000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_balance_after_all_periods_is_zero() {
        let pmt = annuity_payment(dec!(50000), dec!(0.005), 60).unwrap();
        let bal = balance_after_periods(dec!(50000), pmt, dec!(0.005), 60).unwrap();
        assert!(bal.abs() < dec!(0.0001));
    }

    #[test]
    fn test_compound_factor_overflow_is_error() {
        // 25% a month for 40 years is far beyond the decimal range
        let err = compound_factor(dec!(0.25), 480).unwrap_err();
        assert!(matches!(err, PropInvestError::InvalidInput { .. }));
        assert!(annuity_payment(dec!(100000), dec!(0.25), 480).is_err());
    }

    #[test]
    fn test_cagr_doubling_over_ten_years() {
        let result = cagr(dec!(100000), dec!(200000), 10).unwrap();
        assert!((result - dec!(7.177)).abs() < dec!(0.001));
    }

    #[test]
    fn test_cagr_negative_final_is_undefined() {
        let err = cagr(dec!(100000), dec!(-1), 5).unwrap_err();
        assert!(matches!(err, PropInvestError::UndefinedMetric { .. }));
    }

    #[test]
    fn test_cagr_total_loss() {
        assert_eq!(cagr(dec!(100), Decimal::ZERO, 3).unwrap(), dec!(-100));
    }
}
