//! Five-program comparison: validates the borrower inputs, prices each
//! program against the injected rate environment, and ranks the results on
//! monthly payment, cash to close, 5-year and lifetime cost.

use chrono::{NaiveDate, Utc};
use log::{debug, trace};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::monthly_payment;
use crate::error::MortgageError;
use crate::types::{floor_at_zero, with_metadata, ComputationOutput, Money, Percent};
use crate::MortgageResult;

use super::arm::{project_arm_scenarios, ArmScenarios};
use super::closing_costs::itemize_closing_costs;
use super::mortgage_insurance::{
    conventional_pmi, fha_mip, loan_to_value, MortgageInsurance, PmiLoan,
};
use super::rate_table::{CreditScoreBucket, LoanProgram, LoanType, RateEnvironment};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const PERCENT: Decimal = dec!(100);

/// Short projection horizon shown next to the lifetime cost.
pub const SHORT_HORIZON_MONTHS: u32 = 60;

pub const MAX_TERM_YEARS: u32 = 40;

/// Upper bound on the purchase price. Keeps every lifetime product well
/// inside the 96-bit decimal mantissa.
pub const MAX_HOME_PRICE: Money = dec!(1_000_000_000_000);

/// Points are priced at one percent of the loan each.
pub const MAX_DISCOUNT_POINTS: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Borrower inputs for one comparison. Replaced wholesale on every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInputs {
    pub home_price: Money,
    /// Down payment as a percent of the price, in [0, 100).
    pub down_payment_percent: Percent,
    pub loan_term_years: u32,
    pub credit_score: CreditScoreBucket,
    /// Prepaid points; fractional allowed.
    #[serde(default)]
    pub discount_points: Decimal,
    /// Seller concession as a percent of the price.
    #[serde(default)]
    pub seller_credit_percent: Percent,
}

impl LoanInputs {
    pub fn validate(&self) -> MortgageResult<()> {
        if self.home_price <= Decimal::ZERO {
            return Err(MortgageError::invalid(
                "home_price",
                "Home price must be positive",
            ));
        }
        if self.home_price > MAX_HOME_PRICE {
            return Err(MortgageError::invalid(
                "home_price",
                format!("Home price cannot exceed {MAX_HOME_PRICE}"),
            ));
        }
        if self.down_payment_percent < Decimal::ZERO || self.down_payment_percent >= PERCENT {
            return Err(MortgageError::invalid(
                "down_payment_percent",
                "Down payment must be at least 0% and below 100%",
            ));
        }
        if self.loan_term_years == 0 || self.loan_term_years > MAX_TERM_YEARS {
            return Err(MortgageError::invalid(
                "loan_term_years",
                format!("Term must be between 1 and {MAX_TERM_YEARS} years"),
            ));
        }
        if self.discount_points < Decimal::ZERO || self.discount_points > MAX_DISCOUNT_POINTS {
            return Err(MortgageError::invalid(
                "discount_points",
                format!("Discount points must be between 0 and {MAX_DISCOUNT_POINTS}"),
            ));
        }
        if self.seller_credit_percent < Decimal::ZERO || self.seller_credit_percent > PERCENT {
            return Err(MortgageError::invalid(
                "seller_credit_percent",
                "Seller credit must be between 0% and 100%",
            ));
        }
        Ok(())
    }

    pub fn down_payment(&self) -> Money {
        self.home_price * self.down_payment_percent / PERCENT
    }

    pub fn loan_amount(&self) -> Money {
        self.home_price - self.down_payment()
    }

    pub fn term_months(&self) -> u32 {
        self.loan_term_years * 12
    }

    pub fn seller_credit(&self) -> Money {
        self.home_price * self.seller_credit_percent / PERCENT
    }

    /// Upfront cost of the discount points, one percent of the loan each.
    pub fn points_cost(&self) -> Money {
        self.loan_amount() * self.discount_points / PERCENT
    }
}

/// Envelope request: inputs plus the pricing environment and valuation date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub inputs: LoanInputs,
    #[serde(default)]
    pub environment: RateEnvironment,
    /// Date insurance end dates are measured from; today when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub loan_type: LoanType,
    pub name: String,
    pub description: String,
    /// Final annual rate after credit and point adjustments.
    pub rate: Percent,
    pub monthly_pi: Money,
    pub monthly_mi: Money,
    pub monthly_payment: Money,
    /// FHA upfront MIP disclosure; zero for other programs.
    pub upfront_mi: Money,
    pub closing_costs: Money,
    pub cash_to_close: Money,
    pub cost_60_month: Money,
    pub lifetime_cost: Money,
    pub mi_months: Option<u32>,
    /// `None` when insurance lasts for the life of the loan or there is none.
    pub mi_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm_scenarios: Option<ArmScenarios>,
}

/// Column a comparison can be ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    MonthlyPayment,
    CashToClose,
    Cost60Month,
    LifetimeCost,
}

impl LoanResult {
    pub fn metric(&self, metric: ComparisonMetric) -> Money {
        match metric {
            ComparisonMetric::MonthlyPayment => self.monthly_payment,
            ComparisonMetric::CashToClose => self.cash_to_close,
            ComparisonMetric::Cost60Month => self.cost_60_month,
            ComparisonMetric::LifetimeCost => self.lifetime_cost,
        }
    }
}

/// One result per program, keyed by loan type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResults {
    pub conventional: LoanResult,
    pub fha: LoanResult,
    pub va: LoanResult,
    pub usda: LoanResult,
    pub arm: LoanResult,
}

impl LoanResults {
    pub fn get(&self, loan_type: LoanType) -> &LoanResult {
        match loan_type {
            LoanType::Conventional => &self.conventional,
            LoanType::Fha => &self.fha,
            LoanType::Va => &self.va,
            LoanType::Usda => &self.usda,
            LoanType::Arm => &self.arm,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoanResult> {
        LoanType::ALL.into_iter().map(move |t| self.get(t))
    }

    /// The program with the lowest value for `metric`; ties go to the
    /// earlier program in output order.
    pub fn lowest(&self, metric: ComparisonMetric) -> &LoanResult {
        let mut best = &self.conventional;
        for loan in self.iter().skip(1) {
            if loan.metric(metric) < best.metric(metric) {
                best = loan;
            }
        }
        best
    }
}

/// Which program wins each column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestValues {
    pub monthly_payment: LoanType,
    pub cash_to_close: LoanType,
    pub cost_60_month: LoanType,
    pub lifetime_cost: LoanType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanComparison {
    pub loan_amount: Money,
    pub down_payment: Money,
    pub loan_to_value: Percent,
    pub seller_credit: Money,
    /// Cost of the discount points; disclosed, not included in cash to close.
    pub points_cost: Money,
    pub loans: LoanResults,
    pub best: BestValues,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare all five programs for one set of inputs. Pure: identical inputs,
/// environment and `as_of` always give an identical result.
pub fn compare_loans(
    inputs: &LoanInputs,
    environment: &RateEnvironment,
    as_of: NaiveDate,
) -> MortgageResult<LoanComparison> {
    let (comparison, _warnings) = compute_comparison(inputs, environment, as_of)?;
    Ok(comparison)
}

/// Run a comparison wrapped in the standard output envelope.
pub fn run_comparison(
    request: &ComparisonRequest,
) -> MortgageResult<ComputationOutput<LoanComparison>> {
    let start = Instant::now();

    let as_of = request.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let (comparison, warnings) = compute_comparison(&request.inputs, &request.environment, as_of)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization across Conventional, FHA, VA, USDA and 5/1 ARM \
         with LTV-based PMI, FHA MIP and capped ARM stress scenarios",
        request,
        warnings,
        elapsed,
        comparison,
    ))
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Values shared by every program in one run.
struct PricingContext<'a> {
    inputs: &'a LoanInputs,
    environment: &'a RateEnvironment,
    as_of: NaiveDate,
    down_payment: Money,
    loan_amount: Money,
    seller_credit: Money,
    term_months: u32,
}

fn compute_comparison(
    inputs: &LoanInputs,
    environment: &RateEnvironment,
    as_of: NaiveDate,
) -> MortgageResult<(LoanComparison, Vec<String>)> {
    inputs.validate()?;
    environment.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let ctx = PricingContext {
        inputs,
        environment,
        as_of,
        down_payment: inputs.down_payment(),
        loan_amount: inputs.loan_amount(),
        seller_credit: inputs.seller_credit(),
        term_months: inputs.term_months(),
    };
    debug!(
        "comparing programs: loan {} over {} months, credit {}",
        ctx.loan_amount, ctx.term_months, inputs.credit_score
    );

    let [conventional, fha, va, usda, arm] = environment.rates.programs();
    let loans = LoanResults {
        conventional: price_program(conventional, &ctx, &mut warnings)?,
        fha: price_program(fha, &ctx, &mut warnings)?,
        va: price_program(va, &ctx, &mut warnings)?,
        usda: price_program(usda, &ctx, &mut warnings)?,
        arm: price_program(arm, &ctx, &mut warnings)?,
    };

    let short: Vec<&str> = loans
        .iter()
        .filter(|l| ctx.seller_credit > l.closing_costs)
        .map(|l| l.loan_type.key())
        .collect();
    if !short.is_empty() {
        warnings.push(format!(
            "Seller credit of {} exceeds closing costs for: {}",
            ctx.seller_credit.round_dp(2),
            short.join(", ")
        ));
    }

    let best = BestValues {
        monthly_payment: loans.lowest(ComparisonMetric::MonthlyPayment).loan_type,
        cash_to_close: loans.lowest(ComparisonMetric::CashToClose).loan_type,
        cost_60_month: loans.lowest(ComparisonMetric::Cost60Month).loan_type,
        lifetime_cost: loans.lowest(ComparisonMetric::LifetimeCost).loan_type,
    };

    Ok((
        LoanComparison {
            loan_amount: ctx.loan_amount,
            down_payment: ctx.down_payment,
            loan_to_value: loan_to_value(ctx.loan_amount, inputs.home_price)?,
            seller_credit: ctx.seller_credit,
            points_cost: inputs.points_cost(),
            loans,
            best,
        },
        warnings,
    ))
}

fn price_program(
    program: LoanProgram<'_>,
    ctx: &PricingContext<'_>,
    warnings: &mut Vec<String>,
) -> MortgageResult<LoanResult> {
    let info = program.info();
    let inputs = ctx.inputs;
    let env = ctx.environment;

    let raw_rate = info.base_rate + env.credit_adjustment(inputs.credit_score)?
        - inputs.discount_points * env.point_rate_reduction;
    if raw_rate < Decimal::ZERO {
        warnings.push(format!(
            "{} rate of {}% after discount points floored at 0%",
            info.name, raw_rate
        ));
    }
    let rate = floor_at_zero(raw_rate);

    let monthly_pi = monthly_payment(ctx.loan_amount, rate, ctx.term_months)?;

    let mut arm_scenarios = None;
    let mi = match program {
        LoanProgram::Conventional(conv) => {
            let loan = PmiLoan {
                loan_amount: ctx.loan_amount,
                home_value: inputs.home_price,
                annual_rate: rate,
                term_months: ctx.term_months,
                monthly_pi,
            };
            conventional_pmi(
                &loan,
                inputs.down_payment_percent,
                env.pmi_rate(inputs.credit_score)?,
                conv,
                env.pmi_cancellation,
                ctx.as_of,
                warnings,
            )?
        }
        LoanProgram::Fha(fha) => {
            fha_mip(ctx.loan_amount, inputs.down_payment_percent, fha, ctx.as_of)?
        }
        LoanProgram::Va(_) | LoanProgram::Usda(_) => MortgageInsurance::none(),
        LoanProgram::Arm(arm) => {
            arm_scenarios = Some(project_arm_scenarios(
                ctx.loan_amount,
                rate,
                inputs.loan_term_years,
                env.index_rate,
                arm,
            )?);
            MortgageInsurance::none()
        }
    };

    let breakdown =
        itemize_closing_costs(inputs.home_price, ctx.loan_amount, program, &env.closing_costs);
    if let LoanProgram::Va(va) = program {
        if inputs.home_price > va.funding_fee_price_threshold {
            warnings.push(format!(
                "VA funding fee applied: price exceeds {}",
                va.funding_fee_price_threshold
            ));
        }
    }

    let (cost_60_month, lifetime_cost) = projected_costs(monthly_pi, &mi, ctx.term_months);
    trace!(
        "{}: rate {}% P&I {} MI {} ({:?} months)",
        program.loan_type(),
        rate,
        monthly_pi,
        mi.monthly,
        mi.months
    );

    Ok(LoanResult {
        loan_type: program.loan_type(),
        name: info.name.clone(),
        description: info.description.clone(),
        rate,
        monthly_pi,
        monthly_mi: mi.monthly,
        monthly_payment: monthly_pi + mi.monthly,
        upfront_mi: mi.upfront,
        closing_costs: breakdown.total,
        cash_to_close: ctx.down_payment + breakdown.total - ctx.seller_credit,
        cost_60_month,
        lifetime_cost,
        mi_months: mi.months,
        mi_end_date: mi.end_date,
        arm_scenarios,
    })
}

/// 60-month and lifetime cost. Insurance with a known duration is only
/// counted for the months it is actually paid; this applies equally to
/// conventional PMI and FHA MIP.
fn projected_costs(monthly_pi: Money, mi: &MortgageInsurance, term_months: u32) -> (Money, Money) {
    let mi_months_within = |horizon: u32| -> Decimal {
        Decimal::from(mi.months.map_or(horizon, |m| m.min(horizon)))
    };

    let cost_60 = monthly_pi * Decimal::from(SHORT_HORIZON_MONTHS)
        + mi.monthly * mi_months_within(SHORT_HORIZON_MONTHS);
    let lifetime = monthly_pi * Decimal::from(term_months) + mi.monthly * mi_months_within(term_months);
    (cost_60, lifetime)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan_comparison::mortgage_insurance::PmiCancellationMethod;
    use chrono::Months;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn base_inputs() -> LoanInputs {
        LoanInputs {
            home_price: dec!(400_000),
            down_payment_percent: dec!(20),
            loan_term_years: 30,
            credit_score: CreditScoreBucket::Score720To759,
            discount_points: Decimal::ZERO,
            seller_credit_percent: Decimal::ZERO,
        }
    }

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn run(inputs: &LoanInputs) -> LoanComparison {
        compare_loans(inputs, &RateEnvironment::default(), as_of()).unwrap()
    }

    #[test]
    fn test_twenty_down_conventional_has_no_pmi() {
        let cmp = run(&base_inputs());
        let conv = &cmp.loans.conventional;
        assert_eq!(cmp.loan_to_value, dec!(80));
        assert_eq!(conv.monthly_mi, Decimal::ZERO);
        assert_eq!(conv.mi_end_date, None);
        assert_eq!(conv.rate, dec!(6.5) + dec!(0.125));
        assert_eq!(conv.monthly_payment, conv.monthly_pi);
    }

    #[test]
    fn test_ten_down_conventional_pmi_ends_in_future() {
        let inputs = LoanInputs {
            down_payment_percent: dec!(10),
            ..base_inputs()
        };
        let cmp = run(&inputs);
        let conv = &cmp.loans.conventional;
        assert!(conv.monthly_mi > Decimal::ZERO);
        // 360k * 0.45% / 12
        assert_eq!(conv.monthly_mi, dec!(135));
        assert!(conv.mi_end_date.unwrap() > as_of());
    }

    #[test]
    fn test_fha_mip_duration_by_down_payment() {
        let five = run(&LoanInputs {
            down_payment_percent: dec!(5),
            ..base_inputs()
        });
        assert_eq!(five.loans.fha.mi_end_date, None);
        assert!(five.loans.fha.monthly_mi > Decimal::ZERO);

        let fifteen = run(&LoanInputs {
            down_payment_percent: dec!(15),
            ..base_inputs()
        });
        assert_eq!(
            fifteen.loans.fha.mi_end_date,
            as_of().checked_add_months(Months::new(132))
        );
    }

    #[test]
    fn test_fha_mip_applies_at_any_ltv() {
        let cmp = run(&LoanInputs {
            down_payment_percent: dec!(40),
            ..base_inputs()
        });
        // 240k * 0.80% / 12 = 160
        assert_eq!(cmp.loans.fha.monthly_mi, dec!(160));
        // 1.75% of 240k
        assert_eq!(cmp.loans.fha.upfront_mi, dec!(4200));
    }

    #[test]
    fn test_va_usda_arm_carry_no_insurance() {
        let cmp = run(&LoanInputs {
            down_payment_percent: dec!(3),
            ..base_inputs()
        });
        for loan in [&cmp.loans.va, &cmp.loans.usda, &cmp.loans.arm] {
            assert_eq!(loan.monthly_mi, Decimal::ZERO);
            assert_eq!(loan.mi_end_date, None);
        }
    }

    #[test]
    fn test_arm_scenarios_attached_only_to_arm() {
        let cmp = run(&base_inputs());
        let arm = cmp.loans.arm.arm_scenarios.as_ref().unwrap();
        assert_eq!(arm.initial.rate, dec!(5.875));
        assert_eq!(arm.likely.rate, dec!(6.75));
        assert_eq!(arm.best_case.rate, dec!(5.875));
        assert_eq!(arm.worst_case.rate, dec!(8.75));
        assert_eq!(arm.initial.monthly_payment, cmp.loans.arm.monthly_pi);

        for loan in cmp.loans.iter().filter(|l| l.loan_type != LoanType::Arm) {
            assert!(loan.arm_scenarios.is_none());
        }
    }

    #[test]
    fn test_idempotent_for_fixed_as_of() {
        let inputs = LoanInputs {
            down_payment_percent: dec!(7.5),
            discount_points: dec!(1.5),
            seller_credit_percent: dec!(2),
            ..base_inputs()
        };
        assert_eq!(run(&inputs), run(&inputs));
    }

    #[test]
    fn test_discount_points_reduce_rate() {
        let cmp = run(&LoanInputs {
            discount_points: dec!(2),
            ..base_inputs()
        });
        assert_eq!(cmp.loans.conventional.rate, dec!(6.125));
        // 2 points on 320k
        assert_eq!(cmp.points_cost, dec!(6400));
    }

    #[test]
    fn test_rate_floored_at_zero_with_warning() {
        let request = ComparisonRequest {
            inputs: LoanInputs {
                discount_points: dec!(40),
                ..base_inputs()
            },
            environment: RateEnvironment::default(),
            as_of: Some(as_of()),
        };
        let out = run_comparison(&request).unwrap();
        for loan in out.result.loans.iter() {
            assert_eq!(loan.rate, Decimal::ZERO);
            assert_eq!(loan.monthly_pi, dec!(320_000) / dec!(360));
        }
        assert!(out.warnings.iter().any(|w| w.contains("floored at 0%")));
    }

    #[test]
    fn test_cash_to_close_with_seller_credit() {
        let cmp = run(&LoanInputs {
            seller_credit_percent: dec!(1),
            ..base_inputs()
        });
        let conv = &cmp.loans.conventional;
        assert_eq!(cmp.seller_credit, dec!(4000));
        // 80k down + (1995 + 2000 title + 3200 origination) - 4k credit
        assert_eq!(conv.closing_costs, dec!(7195));
        assert_eq!(conv.cash_to_close, dec!(80_000) + dec!(7195) - dec!(4000));
    }

    #[test]
    fn test_seller_credit_above_closing_costs_warns() {
        let request = ComparisonRequest {
            inputs: LoanInputs {
                seller_credit_percent: dec!(6),
                ..base_inputs()
            },
            environment: RateEnvironment::default(),
            as_of: Some(as_of()),
        };
        let out = run_comparison(&request).unwrap();
        assert!(out.warnings.iter().any(|w| w.starts_with("Seller credit")));
    }

    #[test]
    fn test_nominal_costs_without_insurance() {
        let cmp = run(&base_inputs());
        let va = &cmp.loans.va;
        assert_eq!(va.cost_60_month, va.monthly_payment * dec!(60));
        assert_eq!(va.lifetime_cost, va.monthly_payment * dec!(360));
    }

    #[test]
    fn test_conventional_lifetime_counts_only_pmi_months() {
        let cmp = run(&LoanInputs {
            down_payment_percent: dec!(10),
            ..base_inputs()
        });
        let conv = &cmp.loans.conventional;
        let months = conv.mi_months.unwrap();
        assert!(months > 60 && months < 360);
        assert_close(
            conv.cost_60_month,
            conv.monthly_payment * dec!(60),
            dec!(0.000001),
            "PMI paid throughout first 60 months",
        );
        assert_eq!(
            conv.lifetime_cost,
            conv.monthly_pi * dec!(360) + conv.monthly_mi * Decimal::from(months)
        );
        assert!(conv.lifetime_cost < conv.monthly_payment * dec!(360));
    }

    #[test]
    fn test_fha_limited_mip_split_in_lifetime_cost() {
        let cmp = run(&LoanInputs {
            down_payment_percent: dec!(15),
            ..base_inputs()
        });
        let fha = &cmp.loans.fha;
        assert_eq!(
            fha.lifetime_cost,
            fha.monthly_pi * dec!(360) + fha.monthly_mi * dec!(132)
        );

        let life_of_loan = run(&LoanInputs {
            down_payment_percent: dec!(5),
            ..base_inputs()
        });
        let fha = &life_of_loan.loans.fha;
        assert_close(
            fha.lifetime_cost,
            fha.monthly_payment * dec!(360),
            dec!(0.000001),
            "life-of-loan MIP",
        );
    }

    #[test]
    fn test_decay_method_is_deterministic_and_clamped() {
        let mut env = RateEnvironment::default();
        env.pmi_cancellation = PmiCancellationMethod::DecayApproximation;
        let inputs = LoanInputs {
            down_payment_percent: dec!(10),
            ..base_inputs()
        };
        let cmp = compare_loans(&inputs, &env, as_of()).unwrap();
        let conv = &cmp.loans.conventional;
        // The heuristic overshoots the term; lifetime MI is capped at the term.
        assert!(conv.mi_months.unwrap() > 360);
        assert_close(
            conv.lifetime_cost,
            conv.monthly_payment * dec!(360),
            dec!(0.000001),
            "MI capped at term",
        );
        assert_eq!(cmp, compare_loans(&inputs, &env, as_of()).unwrap());
    }

    #[test]
    fn test_lowest_payment_and_best_values() {
        let cmp = run(&base_inputs());
        let lowest = cmp.loans.lowest(ComparisonMetric::MonthlyPayment);
        for loan in cmp.loans.iter() {
            assert!(lowest.monthly_payment <= loan.monthly_payment);
        }
        assert_eq!(cmp.best.monthly_payment, lowest.loan_type);
        // ARM has the lowest base rate and no insurance at 20% down.
        assert_eq!(cmp.best.monthly_payment, LoanType::Arm);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let cases = [
            LoanInputs {
                home_price: Decimal::ZERO,
                ..base_inputs()
            },
            LoanInputs {
                down_payment_percent: dec!(100),
                ..base_inputs()
            },
            LoanInputs {
                down_payment_percent: dec!(-1),
                ..base_inputs()
            },
            LoanInputs {
                loan_term_years: 0,
                ..base_inputs()
            },
            LoanInputs {
                discount_points: dec!(-0.5),
                ..base_inputs()
            },
            LoanInputs {
                seller_credit_percent: dec!(-3),
                ..base_inputs()
            },
            LoanInputs {
                seller_credit_percent: dec!(101),
                ..base_inputs()
            },
            LoanInputs {
                discount_points: dec!(100.5),
                ..base_inputs()
            },
        ];
        for inputs in cases {
            let err = compare_loans(&inputs, &RateEnvironment::default(), as_of());
            assert!(
                matches!(err, Err(MortgageError::InvalidInput { .. })),
                "{:?}",
                inputs
            );
        }
    }

    #[test]
    fn test_oversized_home_price_rejected_not_overflowed() {
        let huge = LoanInputs {
            home_price: dec!(50_000_000_000_000_000_000_000_000_000),
            down_payment_percent: dec!(10),
            ..base_inputs()
        };
        match compare_loans(&huge, &RateEnvironment::default(), as_of()) {
            Err(MortgageError::InvalidInput { field, .. }) => assert_eq!(field, "home_price"),
            other => panic!("expected invalid home_price, got {other:?}"),
        }

        let at_limit = LoanInputs {
            home_price: MAX_HOME_PRICE,
            down_payment_percent: dec!(10),
            discount_points: MAX_DISCOUNT_POINTS,
            seller_credit_percent: dec!(100),
            ..base_inputs()
        };
        let cmp = compare_loans(&at_limit, &RateEnvironment::default(), as_of()).unwrap();
        assert!(cmp.loans.iter().all(|l| l.lifetime_cost > Decimal::ZERO));
    }

    #[test]
    fn test_compare_loans_validates_environment() {
        let mut env = RateEnvironment::default();
        env.rates.arm.caps.lifetime = dec!(-1);
        match compare_loans(&base_inputs(), &env, as_of()) {
            Err(MortgageError::InvalidInput { field, .. }) => assert_eq!(field, "rates.arm.caps"),
            other => panic!("expected invalid caps, got {other:?}"),
        }
    }

    #[test]
    fn test_term_inside_arm_fixed_period_rejected() {
        let err = compare_loans(
            &LoanInputs {
                loan_term_years: 5,
                ..base_inputs()
            },
            &RateEnvironment::default(),
            as_of(),
        );
        assert!(matches!(err, Err(MortgageError::InvalidInput { .. })));
    }

    #[test]
    fn test_output_keys_are_loan_types() {
        let cmp = run(&base_inputs());
        let value = serde_json::to_value(&cmp).unwrap();
        let loans = value["loans"].as_object().unwrap();
        let keys: Vec<&str> = loans.keys().map(|k| k.as_str()).collect();
        for t in LoanType::ALL {
            assert!(keys.contains(&t.key()));
        }
        assert_eq!(loans.len(), 5);
    }

    #[test]
    fn test_request_deserialises_with_default_environment() {
        let json = r#"{
            "inputs": {
                "home_price": "400000",
                "down_payment_percent": "10",
                "loan_term_years": 30,
                "credit_score": "720-759"
            },
            "as_of": "2025-06-01"
        }"#;
        let request: ComparisonRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.environment, RateEnvironment::default());
        let out = run_comparison(&request).unwrap();
        assert_eq!(out.result.loans.conventional.monthly_mi, dec!(135));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
