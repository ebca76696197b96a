use chrono::{NaiveDate, Utc};
use clap::Args;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use mortgage_compare_core::lead::report::{self, LeadContact, LeadReport, LeadSink};
use mortgage_compare_core::loan_comparison::{self, LoanInputs, RateEnvironment};
use mortgage_compare_core::{MortgageError, MortgageResult};

use super::EnvironmentArgs;
use crate::input;

/// Arguments for generating a lead report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to JSON file with `lead` and `inputs` (optionally `environment`, `as_of`)
    #[arg(long)]
    pub input: Option<String>,

    /// Directory the report JSON is written to
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Print the plain-text report instead of structured output
    #[arg(long)]
    pub text: bool,

    #[command(flatten)]
    pub env: EnvironmentArgs,
}

#[derive(Deserialize)]
struct ReportRequest {
    lead: LeadContact,
    inputs: LoanInputs,
    #[serde(default)]
    environment: Option<RateEnvironment>,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

/// Writes each report as pretty JSON into a directory.
struct JsonFileSink {
    dir: PathBuf,
}

impl LeadSink for JsonFileSink {
    fn submit(&mut self, report: &LeadReport) -> MortgageResult<()> {
        let path = self.dir.join(&report.file_name).with_extension("json");
        let body = serde_json::to_string_pretty(report)?;
        fs::write(&path, body).map_err(|e| {
            MortgageError::ReportDelivery(format!("cannot write '{}': {}", path.display(), e))
        })?;
        log::info!("wrote {}", path.display());
        Ok(())
    }
}

/// Build the report. Returns the structured report and its text rendering.
pub fn build(args: &ReportArgs) -> Result<(LeadReport, String), Box<dyn std::error::Error>> {
    let request: ReportRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for a lead report".into());
    };

    let environment = args.env.load_or(request.environment)?;
    let as_of = args
        .env
        .as_of
        .or(request.as_of)
        .unwrap_or_else(|| Utc::now().date_naive());

    let comparison = loan_comparison::compare_loans(&request.inputs, &environment, as_of)?;
    let report = report::build_report(&request.lead, &request.inputs, &comparison, Utc::now())?;

    if let Some(ref dir) = args.out_dir {
        let mut sink = JsonFileSink {
            dir: PathBuf::from(dir),
        };
        report::submit_report(&mut sink, &report)?;
    }

    let text = report::render_text(&report);
    Ok((report, text))
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (report, _) = build(&args)?;
    Ok(serde_json::json!({ "result": report }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mortgage_compare_core::loan_comparison::CreditScoreBucket;
    use rust_decimal_macros::dec;

    fn sample_report(name: &str) -> LeadReport {
        let inputs = LoanInputs {
            home_price: dec!(400_000),
            down_payment_percent: dec!(20),
            loan_term_years: 30,
            credit_score: CreditScoreBucket::Score720To759,
            discount_points: dec!(0),
            seller_credit_percent: dec!(0),
        };
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let cmp =
            loan_comparison::compare_loans(&inputs, &RateEnvironment::default(), as_of).unwrap();
        let lead = LeadContact {
            name: name.into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
        };
        report::build_report(&lead, &inputs, &cmp, Utc::now()).unwrap()
    }

    #[test]
    fn test_sink_writes_json_next_to_report_name() {
        let dir = std::env::temp_dir().join(format!("mcalc-sink-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut sink = JsonFileSink { dir: dir.clone() };
        let report = sample_report("Jane/Q Public");

        report::submit_report(&mut sink, &report).unwrap();
        let written = dir.join("Mortgage-Analysis-Report-Jane-Q-Public.json");
        let parsed: LeadReport =
            serde_json::from_str(&fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(parsed.file_name, report.file_name);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_sink_write_failure_is_delivery_error() {
        let dir = std::env::temp_dir()
            .join(format!("mcalc-missing-{}", std::process::id()))
            .join("absent");
        let mut sink = JsonFileSink { dir };
        let err = sink.submit(&sample_report("Jane Public")).unwrap_err();
        assert!(matches!(err, MortgageError::ReportDelivery(_)));
    }
}
