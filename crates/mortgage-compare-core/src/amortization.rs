//! Level-payment amortization for fixed-rate loans.
//!
//! Rates are annual percentages (6.5 = 6.5%) compounded monthly. All math in
//! `rust_decimal::Decimal`; integer powers go through `checked_powu` so an
//! absurd rate surfaces as an error rather than an overflow panic.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::types::{Money, Percent};
use crate::MortgageResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Balance below which a loan is treated as fully repaid.
const BALANCE_EPSILON: Decimal = dec!(0.005);

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based payment number.
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Balance after this payment.
    pub balance: Money,
}

/// Convert an annual percentage rate to the periodic monthly rate.
pub fn monthly_rate(annual_rate_percent: Percent) -> Decimal {
    annual_rate_percent / PERCENT / MONTHS_PER_YEAR
}

/// Compound growth factor (1 + r)^n.
fn growth_factor(rate: Decimal, periods: u32) -> MortgageResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| {
            MortgageError::DegenerateComputation(format!(
                "(1 + {rate})^{periods} overflows decimal range"
            ))
        })
}

/// Fixed monthly principal-and-interest payment.
///
/// `P * r * (1+r)^n / ((1+r)^n - 1)` with `r = rate / 100 / 12`. A zero
/// monthly rate falls back to straight-line `P / n`. Principal is not
/// guarded: a negative principal yields a negative payment.
pub fn monthly_payment(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
) -> MortgageResult<Money> {
    if term_months == 0 {
        return Err(MortgageError::invalid(
            "term_months",
            "Term must be at least one month",
        ));
    }

    let r = monthly_rate(annual_rate_percent);
    if r.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let factor = growth_factor(r, term_months)?;
    let denom = factor - Decimal::ONE;
    if denom.is_zero() {
        return Err(MortgageError::DivisionByZero {
            context: "monthly payment annuity factor".into(),
        });
    }

    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denom))
        .ok_or_else(|| {
            MortgageError::DegenerateComputation(format!(
                "payment on {principal} at {annual_rate_percent}% overflows decimal range"
            ))
        })
}

/// Outstanding balance after `payments_made` level payments.
pub fn remaining_balance(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
    payments_made: u32,
) -> MortgageResult<Money> {
    if payments_made >= term_months {
        return Ok(Decimal::ZERO);
    }

    let payment = monthly_payment(principal, annual_rate_percent, term_months)?;
    let r = monthly_rate(annual_rate_percent);

    let balance = if r.is_zero() {
        principal - payment * Decimal::from(payments_made)
    } else {
        let factor = growth_factor(r, payments_made)?;
        principal * factor - payment * (factor - Decimal::ONE) / r
    };

    Ok(balance.max(Decimal::ZERO))
}

/// Walk the schedule month by month and return the first payment number
/// after which the balance is at or below `target_balance`.
///
/// Returns `Some(0)` when the principal already sits at or below the target,
/// and `None` if the target is never reached within the term.
pub fn months_until_balance_at_or_below(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
    target_balance: Money,
) -> MortgageResult<Option<u32>> {
    if principal <= target_balance {
        return Ok(Some(0));
    }

    let payment = monthly_payment(principal, annual_rate_percent, term_months)?;
    let r = monthly_rate(annual_rate_percent);
    let mut balance = principal;

    for month in 1..=term_months {
        let interest = balance * r;
        balance -= payment - interest;
        if balance <= target_balance {
            return Ok(Some(month));
        }
    }

    Ok(None)
}

/// Full month-by-month schedule. The final payment absorbs any rounding
/// residue so the closing balance is exactly zero.
pub fn amortization_schedule(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
) -> MortgageResult<Vec<AmortizationRow>> {
    let payment = monthly_payment(principal, annual_rate_percent, term_months)?;
    let r = monthly_rate(annual_rate_percent);

    let mut rows = Vec::with_capacity(term_months as usize);
    let mut balance = principal;

    for month in 1..=term_months {
        let interest = balance * r;
        let mut principal_paid = payment - interest;
        let mut this_payment = payment;

        if month == term_months || principal_paid >= balance {
            principal_paid = balance;
            this_payment = balance + interest;
        }

        balance -= principal_paid;
        if balance.abs() < BALANCE_EPSILON {
            balance = Decimal::ZERO;
        }

        rows.push(AmortizationRow {
            month,
            payment: this_payment,
            interest,
            principal: principal_paid,
            balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    Ok(rows)
}
