use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropInvestError;
use crate::time_value::{annuity_payment, annuity_present_value, balance_after_periods};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::PropInvestResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Longest repayment term accepted.
pub const MAX_TERM_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A fixed-rate repayment mortgage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Nominal annual interest rate in percent (4.5 = 4.5%)
    pub annual_rate_pct: Percent,
    /// Repayment term in whole years
    pub term_years: u32,
}

/// Interest and principal paid within one year of the loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearSplit {
    pub interest: Money,
    pub principal: Money,
}

/// One row of a yearly amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub opening_balance: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub ending_balance: Money,
}

/// Full yearly schedule for a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub annual_payment: Money,
    pub years: Vec<AmortizationYear>,
    pub total_interest: Money,
    pub total_principal: Money,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate_pct: Percent, term_years: u32) -> PropInvestResult<Self> {
        let terms = Self {
            principal,
            annual_rate_pct,
            term_years,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn validate(&self) -> PropInvestResult<()> {
        if self.principal < Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "principal".into(),
                reason: "Loan principal cannot be negative".into(),
            });
        }
        if self.annual_rate_pct < Decimal::ZERO {
            return Err(PropInvestError::InvalidInput {
                field: "annual_rate_pct".into(),
                reason: "Interest rate cannot be negative".into(),
            });
        }
        if self.term_years < 1 {
            return Err(PropInvestError::InvalidInput {
                field: "term_years".into(),
                reason: "Loan term must be at least 1 year".into(),
            });
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(PropInvestError::InvalidInput {
                field: "term_years".into(),
                reason: format!("Loan term cannot exceed {MAX_TERM_YEARS} years"),
            });
        }
        Ok(())
    }

    /// Monthly rate as a fraction: `rate / 100 / 12`.
    pub fn monthly_rate(&self) -> Decimal {
        self.annual_rate_pct / dec!(100) / Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn total_months(&self) -> PropInvestResult<u32> {
        months_in(self.term_years)
    }
}

fn months_in(years: u32) -> PropInvestResult<u32> {
    years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| PropInvestError::InvalidInput {
            field: "years".into(),
            reason: format!("{years} years in months overflows"),
        })
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Level monthly repayment for the loan.
pub fn monthly_payment(terms: &LoanTerms) -> PropInvestResult<Money> {
    terms.validate()?;
    annuity_payment(terms.principal, terms.monthly_rate(), terms.total_months()?)
}

/// Twelve monthly repayments.
pub fn annual_payment(terms: &LoanTerms) -> PropInvestResult<Money> {
    Ok(monthly_payment(terms)? * Decimal::from(MONTHS_PER_YEAR))
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Balance after `months` payments using the closed-form accumulation
/// `P(1+r)^k - pmt((1+r)^k - 1)/r`.
pub fn balance_after_months(terms: &LoanTerms, months: u32) -> PropInvestResult<Money> {
    let payment = monthly_payment(terms)?;
    if months >= terms.total_months()? {
        return Ok(Decimal::ZERO);
    }
    balance_after_periods(terms.principal, payment, terms.monthly_rate(), months)
}

/// Balance after `months` payments by replaying every month.
pub fn simulated_balance(terms: &LoanTerms, months: u32) -> PropInvestResult<Money> {
    let payment = monthly_payment(terms)?;
    let rate = terms.monthly_rate();
    let mut balance = terms.principal;

    for _ in 0..months.min(terms.total_months()?) {
        let interest = balance * rate;
        balance -= payment - interest;
    }

    Ok(balance)
}

/// Balance after `months` payments as the present value of the payments
/// still due on the remaining term.
pub fn remaining_balance_after_months(terms: &LoanTerms, months: u32) -> PropInvestResult<Money> {
    let payment = monthly_payment(terms)?;
    let total = terms.total_months()?;
    if months >= total {
        return Ok(Decimal::ZERO);
    }
    annuity_present_value(payment, terms.monthly_rate(), total - months)
}

/// Outstanding balance after `years_elapsed` whole years; zero once the
/// term has run.
pub fn remaining_balance(terms: &LoanTerms, years_elapsed: u32) -> PropInvestResult<Money> {
    if years_elapsed >= terms.term_years {
        terms.validate()?;
        return Ok(Decimal::ZERO);
    }
    remaining_balance_after_months(terms, months_in(years_elapsed)?)
}

// ---------------------------------------------------------------------------
// Yearly split
// ---------------------------------------------------------------------------

/// Interest and principal paid during loan year `year` (1-based).
///
/// The balance at the start of the year comes from the closed form, then the
/// twelve months of the year are simulated one by one.
pub fn year_interest_principal(terms: &LoanTerms, year: u32) -> PropInvestResult<YearSplit> {
    if year == 0 {
        return Err(PropInvestError::InvalidInput {
            field: "year".into(),
            reason: "Loan years are numbered from 1".into(),
        });
    }

    let payment = monthly_payment(terms)?;
    if year > terms.term_years {
        return Ok(YearSplit {
            interest: Decimal::ZERO,
            principal: Decimal::ZERO,
        });
    }

    let rate = terms.monthly_rate();
    let mut balance = if year == 1 {
        terms.principal
    } else {
        balance_after_periods(terms.principal, payment, rate, months_in(year - 1)?)?
    };

    let mut interest = Decimal::ZERO;
    let mut principal = Decimal::ZERO;
    for _ in 0..MONTHS_PER_YEAR {
        let month_interest = balance * rate;
        let month_principal = payment - month_interest;
        balance -= month_principal;
        interest += month_interest;
        principal += month_principal;
    }

    Ok(YearSplit {
        interest,
        principal,
    })
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Build the year-by-year amortization schedule for a loan.
pub fn build_schedule(
    terms: &LoanTerms,
) -> PropInvestResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    terms.validate()?;
    if terms.principal.is_zero() {
        warnings.push("Loan principal is zero; schedule contains no repayments".into());
    }

    let monthly = monthly_payment(terms)?;
    let annual = monthly * Decimal::from(MONTHS_PER_YEAR);

    let mut years = Vec::with_capacity(terms.term_years as usize);
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut opening_balance = terms.principal;

    for year in 1..=terms.term_years {
        let split = year_interest_principal(terms, year)?;
        let ending_balance = remaining_balance(terms, year)?;

        total_interest += split.interest;
        total_principal += split.principal;

        years.push(AmortizationYear {
            year,
            opening_balance,
            interest_paid: split.interest,
            principal_paid: split.principal,
            ending_balance,
        });
        opening_balance = ending_balance;
    }

    let output = AmortizationSchedule {
        monthly_payment: monthly,
        annual_payment: annual,
        years,
        total_interest,
        total_principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Rate Repayment Mortgage Amortization (monthly compounding)",
        terms,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms(principal: Decimal, rate: Decimal, years: u32) -> LoanTerms {
        LoanTerms::new(principal, rate, years).unwrap()
    }

    #[test]
    fn test_monthly_rate() {
        let t = terms(dec!(100000), dec!(6), 25);
        assert_eq!(t.monthly_rate(), dec!(0.005));
        assert_eq!(t.total_months().unwrap(), 300);
    }

    #[test]
    fn test_rejects_negative_principal() {
        let err = LoanTerms::new(dec!(-1), dec!(4), 25).unwrap_err();
        assert!(matches!(err, PropInvestError::InvalidInput { .. }));
    }

    #[test]
    fn test_rejects_zero_term() {
        assert!(LoanTerms::new(dec!(1000), dec!(4), 0).is_err());
    }

    #[test]
    fn test_rejects_term_beyond_limit() {
        let err = LoanTerms::new(dec!(1000), dec!(4), MAX_TERM_YEARS + 1).unwrap_err();
        assert!(matches!(err, PropInvestError::InvalidInput { .. }));
    }

    #[test]
    fn test_extreme_rate_is_error_not_panic() {
        // 300% a year over 40 years: (1.25)^480 is outside the decimal range
        let t = terms(dec!(100000), dec!(300), 40);
        let err = monthly_payment(&t).unwrap_err();
        assert!(matches!(err, PropInvestError::InvalidInput { .. }));
        assert!(build_schedule(&t).is_err());
        assert!(remaining_balance(&t, 10).is_err());
    }

    #[test]
    fn test_zero_rate_payment_is_straight_line() {
        let t = terms(dec!(120000), Decimal::ZERO, 10);
        assert_eq!(monthly_payment(&t).unwrap(), dec!(1000));
        assert_eq!(annual_payment(&t).unwrap(), dec!(12000));
    }

    #[test]
    fn test_year_one_interest_exact() {
        // Year 1 of 100k at 6%: first month interest is exactly 500.
        let t = terms(dec!(100000), dec!(6), 25);
        let split = year_interest_principal(&t, 1).unwrap();
        let pmt = annual_payment(&t).unwrap();
        assert!(split.interest > dec!(5900) && split.interest < dec!(6000));
        assert!((split.interest + split.principal - pmt).abs() < dec!(0.01));
    }

    #[test]
    fn test_year_zero_rejected() {
        let t = terms(dec!(100000), dec!(6), 25);
        assert!(year_interest_principal(&t, 0).is_err());
    }

    #[test]
    fn test_year_past_term_is_zero() {
        let t = terms(dec!(100000), dec!(6), 5);
        let split = year_interest_principal(&t, 6).unwrap();
        assert_eq!(split.interest, Decimal::ZERO);
        assert_eq!(split.principal, Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_after_term_is_zero() {
        let t = terms(dec!(100000), dec!(6), 5);
        assert_eq!(remaining_balance(&t, 5).unwrap(), Decimal::ZERO);
        assert_eq!(remaining_balance(&t, 40).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_at_start_is_principal() {
        let t = terms(dec!(100000), dec!(6), 5);
        let bal = remaining_balance(&t, 0).unwrap();
        assert!((bal - dec!(100000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_schedule_rows_and_totals() {
        let t = terms(dec!(150000), dec!(5), 20);
        let out = build_schedule(&t).unwrap();
        let s = &out.result;
        assert_eq!(s.years.len(), 20);
        assert!((s.total_principal - dec!(150000)).abs() < dec!(0.01));
        assert_eq!(s.years.last().unwrap().ending_balance, Decimal::ZERO);
        for pair in s.years.windows(2) {
            assert!(pair[1].ending_balance <= pair[0].ending_balance);
            assert_eq!(pair[1].opening_balance, pair[0].ending_balance);
        }
    }

    #[test]
    fn test_schedule_zero_principal_warns() {
        let t = terms(Decimal::ZERO, dec!(5), 2);
        let out = build_schedule(&t).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.result.total_interest, Decimal::ZERO);
    }
}
