//! 5/1 ARM stress test: the payment during the fixed period and three
//! post-adjustment scenarios bounded by the program's rate caps.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::monthly_payment;
use crate::error::MortgageError;
use crate::types::{floor_at_zero, Money, Percent};
use crate::MortgageResult;

use super::rate_table::ArmProgram;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPayment {
    pub rate: Percent,
    pub monthly_payment: Money,
}

/// Payment differences against the fixed-period payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentShock {
    /// How much lower the best case is than the initial payment.
    pub best_case_savings: Money,
    pub likely_increase: Money,
    pub worst_case_increase: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmScenarios {
    pub initial: ScenarioPayment,
    pub best_case: ScenarioPayment,
    pub likely: ScenarioPayment,
    pub worst_case: ScenarioPayment,
    /// Months the post-adjustment scenarios amortize over.
    pub adjustment_months: u32,
    pub payment_shock: PaymentShock,
}

/// Project the four ARM scenarios.
///
/// The initial payment amortizes over the full term. The others amortize the
/// full loan amount over the months left after the fixed period:
/// - best: `max(initial, index + margin - 1)`
/// - likely: `index + margin`, uncapped
/// - worst: `min(initial + lifetime cap, likely + periodic cap)`
pub fn project_arm_scenarios(
    loan_amount: Money,
    initial_rate: Percent,
    term_years: u32,
    index_rate: Percent,
    program: &ArmProgram,
) -> MortgageResult<ArmScenarios> {
    let term_months = term_years
        .checked_mul(12)
        .ok_or_else(|| MortgageError::invalid("loan_term_years", "Term too long"))?;
    if term_months <= program.fixed_period_months {
        return Err(MortgageError::invalid(
            "loan_term_years",
            format!(
                "Term of {term_months} months does not extend past the {}-month fixed period",
                program.fixed_period_months
            ),
        ));
    }
    let adjustment_months = term_months - program.fixed_period_months;

    let initial_rate = floor_at_zero(initial_rate);
    let likely_rate = floor_at_zero(index_rate + program.margin);
    let best_rate = initial_rate.max(likely_rate - Decimal::ONE);
    let worst_rate = floor_at_zero(
        (initial_rate + program.caps.lifetime).min(likely_rate + program.caps.periodic),
    );

    let scenario = |rate: Percent, months: u32| -> MortgageResult<ScenarioPayment> {
        Ok(ScenarioPayment {
            rate,
            monthly_payment: monthly_payment(loan_amount, rate, months)?,
        })
    };

    let initial = scenario(initial_rate, term_months)?;
    let best_case = scenario(best_rate, adjustment_months)?;
    let likely = scenario(likely_rate, adjustment_months)?;
    let worst_case = scenario(worst_rate, adjustment_months)?;

    let payment_shock = PaymentShock {
        best_case_savings: initial.monthly_payment - best_case.monthly_payment,
        likely_increase: likely.monthly_payment - initial.monthly_payment,
        worst_case_increase: worst_case.monthly_payment - initial.monthly_payment,
    };

    Ok(ArmScenarios {
        initial,
        best_case,
        likely,
        worst_case,
        adjustment_months,
        payment_shock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan_comparison::rate_table::RateTable;
    use rust_decimal_macros::dec;

    fn arm() -> ArmProgram {
        RateTable::default().arm
    }

    #[test]
    fn test_reference_scenario_rates() {
        let s = project_arm_scenarios(dec!(320_000), dec!(5.875), 30, dec!(4.5), &arm()).unwrap();
        assert_eq!(s.initial.rate, dec!(5.875));
        assert_eq!(s.likely.rate, dec!(6.75));
        assert_eq!(s.best_case.rate, dec!(5.875));
        assert_eq!(s.worst_case.rate, dec!(8.75));
        assert_eq!(s.adjustment_months, 300);
    }

    #[test]
    fn test_initial_uses_full_term() {
        let s = project_arm_scenarios(dec!(320_000), dec!(5.875), 30, dec!(4.5), &arm()).unwrap();
        let full = monthly_payment(dec!(320_000), dec!(5.875), 360).unwrap();
        let remaining = monthly_payment(dec!(320_000), dec!(5.875), 300).unwrap();
        assert_eq!(s.initial.monthly_payment, full);
        assert_eq!(s.best_case.monthly_payment, remaining);
    }

    #[test]
    fn test_scenarios_ordered() {
        let s = project_arm_scenarios(dec!(320_000), dec!(5.875), 30, dec!(4.5), &arm()).unwrap();
        assert!(s.initial.monthly_payment <= s.best_case.monthly_payment);
        assert!(s.best_case.monthly_payment <= s.likely.monthly_payment);
        assert!(s.likely.monthly_payment <= s.worst_case.monthly_payment);
        assert!(s.payment_shock.worst_case_increase > s.payment_shock.likely_increase);
    }

    #[test]
    fn test_worst_case_bounded_by_caps() {
        let program = arm();
        for index in [dec!(0.5), dec!(2), dec!(4.5), dec!(7), dec!(10)] {
            for initial in [dec!(3), dec!(5.75), dec!(8)] {
                let s = project_arm_scenarios(dec!(250_000), initial, 30, index, &program).unwrap();
                let bound = (initial + dec!(5)).min(s.likely.rate + dec!(2));
                assert!(s.worst_case.rate <= bound, "index {} initial {}", index, initial);
            }
        }
    }

    #[test]
    fn test_lifetime_cap_binds_when_index_high() {
        // likely = 9 + 2.25 = 11.25; initial + 5 = 10.75 < 13.25
        let s = project_arm_scenarios(dec!(200_000), dec!(5.75), 30, dec!(9), &arm()).unwrap();
        assert_eq!(s.worst_case.rate, dec!(10.75));
        // best = max(5.75, 10.25)
        assert_eq!(s.best_case.rate, dec!(10.25));
    }

    #[test]
    fn test_rates_floored_at_zero() {
        let s = project_arm_scenarios(dec!(200_000), dec!(-0.5), 30, dec!(-4), &arm()).unwrap();
        assert_eq!(s.initial.rate, Decimal::ZERO);
        assert_eq!(s.likely.rate, Decimal::ZERO);
        assert!(s.worst_case.rate >= Decimal::ZERO);
        assert_eq!(s.initial.monthly_payment, dec!(200_000) / dec!(360));
    }

    #[test]
    fn test_term_within_fixed_period_rejected() {
        let err = project_arm_scenarios(dec!(200_000), dec!(5.75), 5, dec!(4.5), &arm());
        assert!(matches!(err, Err(MortgageError::InvalidInput { .. })));
    }
}
