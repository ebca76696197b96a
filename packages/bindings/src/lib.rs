use chrono::{NaiveDate, Utc};
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use mortgage_compare_core::amortization;
use mortgage_compare_core::lead::property::{
    AddressSuggestions, InMemoryPropertyLookup, PropertyFilter,
};
use mortgage_compare_core::lead::report::{self, LeadContact};
use mortgage_compare_core::loan_comparison::{
    self, ComparisonRequest, LoanInputs, LoanType, RateEnvironment,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn environment(env: Option<RateEnvironment>) -> NapiResult<RateEnvironment> {
    let env = env.unwrap_or_default();
    env.validate().map_err(to_napi_error)?;
    Ok(env)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_loans(input_json: String) -> NapiResult<String> {
    let request: ComparisonRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_comparison::run_comparison(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PaymentInput {
    principal: Decimal,
    annual_rate: Decimal,
    term_months: u32,
    #[serde(default)]
    include_schedule: bool,
}

#[napi]
pub fn monthly_payment(input_json: String) -> NapiResult<String> {
    let input: PaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment =
        amortization::monthly_payment(input.principal, input.annual_rate, input.term_months)
            .map_err(to_napi_error)?;
    let schedule = if input.include_schedule {
        Some(
            amortization::amortization_schedule(
                input.principal,
                input.annual_rate,
                input.term_months,
            )
            .map_err(to_napi_error)?,
        )
    } else {
        None
    };
    let output = serde_json::json!({
        "monthly_payment": payment,
        "schedule": schedule,
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ClosingCostsInput {
    home_price: Decimal,
    loan_amount: Decimal,
    loan_type: LoanType,
    #[serde(default)]
    environment: Option<RateEnvironment>,
}

#[napi]
pub fn closing_costs(input_json: String) -> NapiResult<String> {
    let input: ClosingCostsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let env = environment(input.environment)?;
    let breakdown = loan_comparison::itemize_closing_costs(
        input.home_price,
        input.loan_amount,
        env.rates.program(input.loan_type),
        &env.closing_costs,
    );
    serde_json::to_string(&breakdown).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ArmInput {
    loan_amount: Decimal,
    initial_rate: Decimal,
    term_years: u32,
    #[serde(default)]
    index_rate: Option<Decimal>,
    #[serde(default)]
    environment: Option<RateEnvironment>,
}

#[napi]
pub fn arm_scenarios(input_json: String) -> NapiResult<String> {
    let input: ArmInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let env = environment(input.environment)?;
    let scenarios = loan_comparison::project_arm_scenarios(
        input.loan_amount,
        input.initial_rate,
        input.term_years,
        input.index_rate.unwrap_or(env.index_rate),
        &env.rates.arm,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&scenarios).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Lead report
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ReportInput {
    lead: LeadContact,
    inputs: LoanInputs,
    #[serde(default)]
    environment: Option<RateEnvironment>,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[napi]
pub fn build_lead_report(input_json: String) -> NapiResult<String> {
    let input: ReportInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let env = environment(input.environment)?;
    let as_of = input.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let comparison =
        loan_comparison::compare_loans(&input.inputs, &env, as_of).map_err(to_napi_error)?;
    let report = report::build_report(&input.lead, &input.inputs, &comparison, Utc::now())
        .map_err(to_napi_error)?;
    serde_json::to_string(&report).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[napi]
pub fn search_properties(filter_json: String) -> NapiResult<String> {
    let filter: PropertyFilter = serde_json::from_str(&filter_json).map_err(to_napi_error)?;
    let hits = InMemoryPropertyLookup::sample().search(&filter);
    serde_json::to_string(&hits).map_err(to_napi_error)
}

#[napi]
pub fn suggest_addresses(partial: String) -> NapiResult<String> {
    let suggestions = InMemoryPropertyLookup::sample()
        .suggest(&partial)
        .map_err(to_napi_error)?;
    serde_json::to_string(&suggestions).map_err(to_napi_error)
}
