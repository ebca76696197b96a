//! Mortgage insurance: conventional PMI with LTV-based cancellation and FHA
//! MIP with its down-payment-dependent rate and duration.
//!
//! Dates are computed from an explicit `as_of` date so results are
//! reproducible.

use chrono::{Months, NaiveDate};
use log::{debug, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::months_until_balance_at_or_below;
use crate::error::MortgageError;
use crate::types::{Money, Percent};
use crate::MortgageResult;

use super::rate_table::{ConventionalProgram, FhaProgram};

const PERCENT: Decimal = dec!(100);
const MONTHS_PER_YEAR: Decimal = dec!(12);

/// How the PMI drop-off month is estimated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PmiCancellationMethod {
    /// Walk the amortization schedule until the balance reaches the
    /// cancellation LTV of the original value.
    #[default]
    ScheduleWalk,
    /// `ceil(ln(cancel_ltv) / ln(1 - P&I / loan)) * 12` months. Quick
    /// directional estimate; overshoots considerably at typical rates.
    DecayApproximation,
}

/// Mortgage insurance attached to one loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageInsurance {
    pub monthly: Money,
    /// Financed or paid at closing; informational only.
    pub upfront: Money,
    /// Number of monthly premiums before insurance ends. `None` means it
    /// runs for the life of the loan, or that there is no insurance.
    pub months: Option<u32>,
    pub end_date: Option<NaiveDate>,
}

impl MortgageInsurance {
    pub fn none() -> Self {
        Self {
            monthly: Decimal::ZERO,
            upfront: Decimal::ZERO,
            months: None,
            end_date: None,
        }
    }

    /// True when premiums stop before the loan is repaid.
    pub fn is_limited(&self) -> bool {
        self.months.is_some() && !self.monthly.is_zero()
    }
}

/// Everything the PMI estimate needs about the loan.
#[derive(Debug, Clone, Copy)]
pub struct PmiLoan {
    pub loan_amount: Money,
    pub home_value: Money,
    pub annual_rate: Percent,
    pub term_months: u32,
    pub monthly_pi: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Loan-to-value as a percentage.
pub fn loan_to_value(loan_amount: Money, home_value: Money) -> MortgageResult<Percent> {
    if home_value.is_zero() {
        return Err(MortgageError::DivisionByZero {
            context: "loan-to-value with zero home value".into(),
        });
    }
    Ok(loan_amount / home_value * PERCENT)
}

/// Monthly PMI premium. Zero at or below the program's LTV threshold.
pub fn monthly_pmi(
    loan_amount: Money,
    home_value: Money,
    annual_pmi_rate: Percent,
    program: &ConventionalProgram,
) -> MortgageResult<Money> {
    let ltv = loan_to_value(loan_amount, home_value)?;
    if ltv <= program.pmi_ltv_threshold {
        return Ok(Decimal::ZERO);
    }
    Ok(loan_amount * annual_pmi_rate / PERCENT / MONTHS_PER_YEAR)
}

/// Months of PMI before the balance reaches the cancellation LTV.
///
/// Returns `Ok(None)` when the estimate is undefined (a degenerate decay
/// ratio, or a schedule that never reaches the target); a message explaining
/// why is pushed onto `warnings`.
pub fn pmi_cancellation_months(
    loan: &PmiLoan,
    cancel_ltv: Percent,
    method: PmiCancellationMethod,
    warnings: &mut Vec<String>,
) -> MortgageResult<Option<u32>> {
    match method {
        PmiCancellationMethod::ScheduleWalk => {
            let target = loan.home_value * cancel_ltv / PERCENT;
            let months = months_until_balance_at_or_below(
                loan.loan_amount,
                loan.annual_rate,
                loan.term_months,
                target,
            )?;
            if months.is_none() {
                warnings.push(format!(
                    "Balance never reaches {cancel_ltv}% LTV within the term; PMI treated as permanent"
                ));
            }
            Ok(months)
        }
        PmiCancellationMethod::DecayApproximation => {
            match decay_approximation_months(loan, cancel_ltv) {
                Some(m) => Ok(Some(m)),
                None => {
                    let msg = format!(
                        "PMI cancellation estimate undefined for payment {} on loan {}; no end date reported",
                        loan.monthly_pi, loan.loan_amount
                    );
                    warn!("{msg}");
                    warnings.push(msg);
                    Ok(None)
                }
            }
        }
    }
}

/// PMI for a conventional loan. Only charged when the down payment is below
/// `100 - pmi_ltv_threshold` percent and the LTV exceeds the threshold.
pub fn conventional_pmi(
    loan: &PmiLoan,
    down_payment_percent: Percent,
    annual_pmi_rate: Percent,
    program: &ConventionalProgram,
    method: PmiCancellationMethod,
    as_of: NaiveDate,
    warnings: &mut Vec<String>,
) -> MortgageResult<MortgageInsurance> {
    if down_payment_percent >= PERCENT - program.pmi_ltv_threshold {
        return Ok(MortgageInsurance::none());
    }

    let monthly = monthly_pmi(loan.loan_amount, loan.home_value, annual_pmi_rate, program)?;
    if monthly.is_zero() {
        return Ok(MortgageInsurance::none());
    }

    let months = pmi_cancellation_months(loan, program.pmi_cancel_ltv, method, warnings)?;
    let end_date = months.map(|m| add_months(as_of, m)).transpose()?;
    debug!("PMI {monthly}/month for {months:?} months (method {method:?})");

    Ok(MortgageInsurance {
        monthly,
        upfront: Decimal::ZERO,
        months,
        end_date,
    })
}

/// Annual MIP rate for the given down payment.
pub fn fha_annual_mip_rate(down_payment_percent: Percent, program: &FhaProgram) -> Percent {
    if down_payment_percent >= program.reduced_mip_min_down_percent {
        program.reduced_annual_mip_rate
    } else {
        program.annual_mip_rate
    }
}

/// Upfront MIP charged at closing.
pub fn fha_upfront_mip(loan_amount: Money, program: &FhaProgram) -> Money {
    loan_amount * program.upfront_mip_rate / PERCENT
}

/// FHA MIP. Always charged; ends after `limited_mip_years` when the down
/// payment meets the reduced-MIP threshold, otherwise lasts the life of the
/// loan.
pub fn fha_mip(
    loan_amount: Money,
    down_payment_percent: Percent,
    program: &FhaProgram,
    as_of: NaiveDate,
) -> MortgageResult<MortgageInsurance> {
    let rate = fha_annual_mip_rate(down_payment_percent, program);
    let monthly = loan_amount * rate / PERCENT / MONTHS_PER_YEAR;

    let months = if down_payment_percent >= program.reduced_mip_min_down_percent {
        Some(program.limited_mip_years.checked_mul(12).ok_or_else(|| {
            MortgageError::invalid("rates.fha.limited_mip_years", "MIP duration too long")
        })?)
    } else {
        None
    };
    let end_date = months.map(|m| add_months(as_of, m)).transpose()?;

    Ok(MortgageInsurance {
        monthly,
        upfront: fha_upfront_mip(loan_amount, program),
        months,
        end_date,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn add_months(as_of: NaiveDate, months: u32) -> MortgageResult<NaiveDate> {
    as_of
        .checked_add_months(Months::new(months))
        .ok_or_else(|| MortgageError::DateError(format!("{as_of} + {months} months out of range")))
}

/// The logarithmic decay heuristic. `None` whenever a logarithm or division
/// would be undefined.
fn decay_approximation_months(loan: &PmiLoan, cancel_ltv: Percent) -> Option<u32> {
    if loan.loan_amount <= Decimal::ZERO {
        return None;
    }
    let decay = Decimal::ONE - loan.monthly_pi / loan.loan_amount;
    if decay <= Decimal::ZERO || decay >= Decimal::ONE {
        return None;
    }
    let target = cancel_ltv / PERCENT;
    if target <= Decimal::ZERO || target >= Decimal::ONE {
        return None;
    }

    let denom = decay.checked_ln()?;
    if denom.is_zero() {
        return None;
    }
    let periods = target.checked_ln()?.checked_div(denom)?.ceil();
    let months = periods.checked_mul(MONTHS_PER_YEAR)?.to_u32()?;
    (months > 0).then_some(months)
}
