//! Lead-capture report: a finished comparison bundled with the borrower's
//! contact details, ready for a document renderer or CRM sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MortgageError;
use crate::loan_comparison::{ComparisonMetric, LoanComparison, LoanInputs, LoanType};
use crate::types::Money;
use crate::MortgageResult;

const FILE_PREFIX: &str = "Mortgage-Analysis-Report";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl LeadContact {
    pub fn validate(&self) -> MortgageResult<()> {
        if self.name.trim().is_empty() {
            return Err(MortgageError::invalid("name", "Full name is required"));
        }
        if self.email.trim().is_empty() || !looks_like_email(&self.email) {
            return Err(MortgageError::invalid(
                "email",
                "A valid email address is required",
            ));
        }
        if self.phone.trim().is_empty() {
            return Err(MortgageError::invalid("phone", "Phone number is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadReport {
    pub lead: LeadContact,
    pub inputs: LoanInputs,
    pub calculations: LoanComparison,
    pub generated_at: DateTime<Utc>,
    /// Program with the lowest monthly payment.
    pub recommended: LoanType,
    pub recommended_monthly_payment: Money,
    /// Upfront FHA MIP, disclosed separately from the monthly figures.
    pub fha_upfront_mip: Money,
    pub file_name: String,
}

/// Anything that accepts a finished report (CRM, mailer, file writer).
pub trait LeadSink {
    fn submit(&mut self, report: &LeadReport) -> MortgageResult<()>;
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the contact and assemble the report.
pub fn build_report(
    lead: &LeadContact,
    inputs: &LoanInputs,
    comparison: &LoanComparison,
    generated_at: DateTime<Utc>,
) -> MortgageResult<LeadReport> {
    lead.validate()?;

    let best = comparison.loans.lowest(ComparisonMetric::MonthlyPayment);

    Ok(LeadReport {
        lead: lead.clone(),
        inputs: inputs.clone(),
        calculations: comparison.clone(),
        generated_at,
        recommended: best.loan_type,
        recommended_monthly_payment: best.monthly_payment,
        fha_upfront_mip: comparison.loans.fha.upfront_mi,
        file_name: report_file_name(&lead.name),
    })
}

/// `Mortgage-Analysis-Report-Jane-Q-Public.pdf`. Whitespace and path
/// separators in the name become dashes.
pub fn report_file_name(name: &str) -> String {
    let slug: Vec<&str> = name
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect();
    format!("{FILE_PREFIX}-{}.pdf", slug.join("-"))
}

/// Validate the report and hand it to a sink.
pub fn submit_report(sink: &mut dyn LeadSink, report: &LeadReport) -> MortgageResult<()> {
    report.lead.validate()?;
    log::info!("submitting lead report {}", report.file_name);
    sink.submit(report)
}

/// Plain-text rendering of the report body.
pub fn render_text(report: &LeadReport) -> String {
    report.to_string()
}

impl fmt::Display for LeadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs = &self.inputs;
        let cmp = &self.calculations;

        writeln!(f, "Mortgage Analysis Report")?;
        writeln!(
            f,
            "Prepared for {} <{}> {}",
            self.lead.name, self.lead.email, self.lead.phone
        )?;
        writeln!(f, "Generated {}", self.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(f)?;
        writeln!(f, "Home price:      {}", money(inputs.home_price))?;
        writeln!(
            f,
            "Down payment:    {}% ({})",
            inputs.down_payment_percent,
            money(cmp.down_payment)
        )?;
        writeln!(f, "Loan amount:     {}", money(cmp.loan_amount))?;
        writeln!(f, "Term:            {} years", inputs.loan_term_years)?;
        writeln!(f, "Credit score:    {}", inputs.credit_score)?;
        if !inputs.discount_points.is_zero() {
            writeln!(
                f,
                "Discount points: {} ({})",
                inputs.discount_points,
                money(cmp.points_cost)
            )?;
        }
        if !cmp.seller_credit.is_zero() {
            writeln!(f, "Seller credit:   {}", money(cmp.seller_credit))?;
        }

        for loan in cmp.loans.iter() {
            writeln!(f)?;
            writeln!(f, "{} ({}%)", loan.name, loan.rate)?;
            writeln!(f, "  Monthly payment: {}", money(loan.monthly_payment))?;
            writeln!(f, "  Principal & interest: {}", money(loan.monthly_pi))?;
            if !loan.monthly_mi.is_zero() {
                let ends = loan
                    .mi_end_date
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_else(|| "life of loan".to_string());
                writeln!(
                    f,
                    "  Mortgage insurance: {} (until {})",
                    money(loan.monthly_mi),
                    ends
                )?;
            }
            if !loan.upfront_mi.is_zero() {
                writeln!(f, "  Upfront MIP: {}", money(loan.upfront_mi))?;
            }
            writeln!(f, "  Cash to close: {}", money(loan.cash_to_close))?;
            writeln!(f, "  5-year cost: {}", money(loan.cost_60_month))?;
            writeln!(f, "  Lifetime cost: {}", money(loan.lifetime_cost))?;
            if let Some(arm) = &loan.arm_scenarios {
                for (label, s) in [
                    ("Best case", &arm.best_case),
                    ("Likely", &arm.likely),
                    ("Worst case", &arm.worst_case),
                ] {
                    writeln!(
                        f,
                        "  After year 5, {}: {} at {}%",
                        label,
                        money(s.monthly_payment),
                        s.rate
                    )?;
                }
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Lowest monthly payment: {} at {}",
            cmp.loans.get(self.recommended).name,
            money(self.recommended_monthly_payment)
        )
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn money(value: Money) -> String {
    format!("${}", value.round_dp(2))
}

/// Something shaped like `local@domain.tld` somewhere in the string.
fn looks_like_email(s: &str) -> bool {
    s.split_whitespace().any(|token| {
        token.char_indices().any(|(at, c)| {
            if c != '@' || at == 0 {
                return false;
            }
            let domain = &token[at + 1..];
            domain
                .char_indices()
                .any(|(dot, d)| d == '.' && dot > 0 && dot + 1 < domain.len())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan_comparison::{compare_loans, CreditScoreBucket, RateEnvironment};
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct RecordingSink {
        received: Vec<String>,
    }

    impl LeadSink for RecordingSink {
        fn submit(&mut self, report: &LeadReport) -> MortgageResult<()> {
            self.received.push(report.file_name.clone());
            Ok(())
        }
    }

    fn contact() -> LeadContact {
        LeadContact {
            name: "Jane Q Public".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
        }
    }

    fn inputs() -> LoanInputs {
        LoanInputs {
            home_price: dec!(400_000),
            down_payment_percent: dec!(15),
            loan_term_years: 30,
            credit_score: CreditScoreBucket::Score680To719,
            discount_points: dec!(1),
            seller_credit_percent: dec!(1),
        }
    }

    fn report() -> LeadReport {
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let cmp = compare_loans(&inputs(), &RateEnvironment::default(), as_of).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        build_report(&contact(), &inputs(), &cmp, at).unwrap()
    }

    #[test]
    fn test_file_name_replaces_whitespace() {
        assert_eq!(
            report_file_name("Jane  Q\tPublic"),
            "Mortgage-Analysis-Report-Jane-Q-Public.pdf"
        );
    }

    #[test]
    fn test_file_name_strips_path_separators() {
        let name = report_file_name("Jane/Doe \\ ../etc");
        assert_eq!(name, "Mortgage-Analysis-Report-Jane-Doe-..-etc.pdf");
        assert!(!name.contains('/') && !name.contains('\\'));
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(looks_like_email("first.last@mail.example.org"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.com"));
        assert!(!looks_like_email("a@.com"));
        assert!(!looks_like_email("a@b."));
        assert!(!looks_like_email("plainaddress"));
    }

    #[test]
    fn test_contact_validation_fields() {
        let cases = [
            (LeadContact { name: " ".into(), ..contact() }, "name"),
            (LeadContact { email: "nope".into(), ..contact() }, "email"),
            (LeadContact { phone: "".into(), ..contact() }, "phone"),
        ];
        for (lead, expected) in cases {
            match lead.validate() {
                Err(MortgageError::InvalidInput { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
        assert!(contact().validate().is_ok());
    }

    #[test]
    fn test_report_recommends_lowest_payment() {
        let report = report();
        let lowest = report
            .calculations
            .loans
            .iter()
            .map(|l| l.monthly_payment)
            .min()
            .unwrap();
        assert_eq!(report.recommended_monthly_payment, lowest);
        assert_eq!(report.file_name, "Mortgage-Analysis-Report-Jane-Q-Public.pdf");
        assert!(report.fha_upfront_mip > Decimal::ZERO);
    }

    #[test]
    fn test_submit_reaches_sink() {
        let mut sink = RecordingSink { received: Vec::new() };
        submit_report(&mut sink, &report()).unwrap();
        assert_eq!(sink.received, vec![report().file_name]);
    }

    #[test]
    fn test_render_text_mentions_every_program() {
        let text = render_text(&report());
        for name in ["Conventional", "FHA", "VA", "USDA", "ARM 5/1"] {
            assert!(text.contains(name), "missing {name}");
        }
        assert!(text.contains("Upfront MIP"));
        assert!(text.contains("Worst case"));
        assert!(text.contains("Seller credit:"));
    }
}
