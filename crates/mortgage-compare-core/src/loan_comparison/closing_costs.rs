//! Closing cost estimate: flat lender and third-party fees, percentage-based
//! title and origination charges, and the program-specific upfront fees.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

use super::mortgage_insurance::fha_upfront_mip;
use super::rate_table::LoanProgram;

const PERCENT: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Lender and third-party fees common to every program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosingCostSchedule {
    pub appraisal: Money,
    pub credit_report: Money,
    /// Percent of the home price.
    pub title_insurance_rate: Percent,
    /// Percent of the loan amount.
    pub origination_rate: Percent,
    pub underwriting: Money,
    pub processing: Money,
}

impl Default for ClosingCostSchedule {
    fn default() -> Self {
        Self {
            appraisal: dec!(500),
            credit_report: dec!(50),
            title_insurance_rate: dec!(0.5),
            origination_rate: dec!(1),
            underwriting: dec!(995),
            processing: dec!(450),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingCostItem {
    pub label: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingCostBreakdown {
    pub items: Vec<ClosingCostItem>,
    pub total: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Itemised closing costs for one program. FHA adds its upfront MIP; VA adds
/// the funding fee once the price exceeds the program threshold.
pub fn itemize_closing_costs(
    home_price: Money,
    loan_amount: Money,
    program: LoanProgram<'_>,
    schedule: &ClosingCostSchedule,
) -> ClosingCostBreakdown {
    let mut items = vec![
        item("Appraisal", schedule.appraisal),
        item("Credit report", schedule.credit_report),
        item(
            "Title insurance",
            home_price * schedule.title_insurance_rate / PERCENT,
        ),
        item(
            "Origination",
            loan_amount * schedule.origination_rate / PERCENT,
        ),
        item("Underwriting", schedule.underwriting),
        item("Processing", schedule.processing),
    ];

    match program {
        LoanProgram::Fha(fha) => items.push(item("Upfront MIP", fha_upfront_mip(loan_amount, fha))),
        LoanProgram::Va(va) if home_price > va.funding_fee_price_threshold => items.push(item(
            "VA funding fee",
            loan_amount * va.funding_fee_rate / PERCENT,
        )),
        LoanProgram::Conventional(_)
        | LoanProgram::Va(_)
        | LoanProgram::Usda(_)
        | LoanProgram::Arm(_) => {}
    }

    let total = items.iter().map(|i| i.amount).sum();
    ClosingCostBreakdown { items, total }
}

/// Total closing costs for one program.
pub fn closing_costs(
    home_price: Money,
    loan_amount: Money,
    program: LoanProgram<'_>,
    schedule: &ClosingCostSchedule,
) -> Money {
    itemize_closing_costs(home_price, loan_amount, program, schedule).total
}

fn item(label: &str, amount: Money) -> ClosingCostItem {
    ClosingCostItem {
        label: label.to_string(),
        amount,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan_comparison::rate_table::{LoanType, RateTable};
    use rust_decimal_macros::dec;

    // Flat fees: 500 + 50 + 995 + 450
    const FLAT_FEES: Decimal = dec!(1995);

    fn costs(table: &RateTable, loan_type: LoanType, price: Money, loan: Money) -> Money {
        closing_costs(
            price,
            loan,
            table.program(loan_type),
            &ClosingCostSchedule::default(),
        )
    }

    #[test]
    fn test_conventional_base_schedule() {
        let table = RateTable::default();
        // title 0.5% of 400k = 2000; origination 1% of 320k = 3200
        let total = costs(&table, LoanType::Conventional, dec!(400_000), dec!(320_000));
        assert_eq!(total, FLAT_FEES + dec!(2000) + dec!(3200));
    }

    #[test]
    fn test_fha_adds_upfront_mip() {
        let table = RateTable::default();
        let conv = costs(&table, LoanType::Conventional, dec!(400_000), dec!(380_000));
        let fha = costs(&table, LoanType::Fha, dec!(400_000), dec!(380_000));
        // 1.75% of 380k
        assert_eq!(fha - conv, dec!(6650));
    }

    #[test]
    fn test_va_funding_fee_only_above_threshold() {
        let table = RateTable::default();
        let at_limit = costs(&table, LoanType::Va, dec!(766_550), dec!(700_000));
        let usda = costs(&table, LoanType::Usda, dec!(766_550), dec!(700_000));
        assert_eq!(at_limit, usda);

        let above = costs(&table, LoanType::Va, dec!(800_000), dec!(700_000));
        let usda_above = costs(&table, LoanType::Usda, dec!(800_000), dec!(700_000));
        // 2.3% of 700k
        assert_eq!(above - usda_above, dec!(16_100));
    }

    #[test]
    fn test_breakdown_items_sum_to_total() {
        let table = RateTable::default();
        let breakdown = itemize_closing_costs(
            dec!(900_000),
            dec!(810_000),
            table.program(LoanType::Va),
            &ClosingCostSchedule::default(),
        );
        assert_eq!(breakdown.items.len(), 7);
        let sum: Decimal = breakdown.items.iter().map(|i| i.amount).sum();
        assert_eq!(sum, breakdown.total);
        assert_eq!(breakdown.items.last().unwrap().label, "VA funding fee");
    }

    #[test]
    fn test_non_negative_for_zero_loan() {
        let table = RateTable::default();
        for loan_type in LoanType::ALL {
            let total = costs(&table, loan_type, dec!(250_000), Decimal::ZERO);
            assert!(total >= FLAT_FEES);
        }
    }
}
