use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use mortgage_compare_core::amortization;
use mortgage_compare_core::loan_comparison::{self, LoanType};

use super::{EnvironmentArgs, LoanTypeArg};

/// Arguments for a single level-payment calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaymentArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Decimal,

    /// Annual rate in percent (e.g. 6.5)
    #[arg(long)]
    pub rate: Decimal,

    /// Term in years
    #[arg(long, default_value_t = 30)]
    pub term: u32,
}

/// Arguments for itemised closing costs
#[derive(Args)]
pub struct ClosingCostsArgs {
    /// Home purchase price
    #[arg(long)]
    pub home_price: Decimal,

    /// Down payment as a percent of the price
    #[arg(long, default_value_t = Decimal::from(20))]
    pub down_payment: Decimal,

    /// Program whose extra fees apply
    #[arg(long, value_enum, default_value = "conventional")]
    pub loan_type: LoanTypeArg,

    #[command(flatten)]
    pub env: EnvironmentArgs,
}

/// Arguments for the ARM adjustment stress test
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ArmArgs {
    /// Amount borrowed
    #[arg(long)]
    pub loan_amount: Decimal,

    /// Rate during the fixed period (defaults to the program's base rate)
    #[arg(long)]
    pub initial_rate: Option<Decimal>,

    /// Term in years
    #[arg(long, default_value_t = 30)]
    pub term: u32,

    /// Index rate at first adjustment (defaults to the environment's index)
    #[arg(long)]
    pub index: Option<Decimal>,

    #[command(flatten)]
    pub env: EnvironmentArgs,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let months = term_months(args.term)?;
    let payment = amortization::monthly_payment(args.principal, args.rate, months)?;
    let total_paid = payment * Decimal::from(months);

    Ok(json!({
        "result": {
            "principal": args.principal,
            "annual_rate": args.rate,
            "term_months": months,
            "monthly_payment": payment.round_dp(2),
            "total_paid": total_paid.round_dp(2),
            "total_interest": (total_paid - args.principal).round_dp(2),
        }
    }))
}

pub fn run_schedule(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let months = term_months(args.term)?;
    let rows = amortization::amortization_schedule(args.principal, args.rate, months)?;
    let rounded: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "month": row.month,
                "payment": row.payment.round_dp(2),
                "interest": row.interest.round_dp(2),
                "principal": row.principal.round_dp(2),
                "balance": row.balance.round_dp(2),
            })
        })
        .collect();
    Ok(Value::Array(rounded))
}

pub fn run_closing_costs(args: ClosingCostsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let env = args.env.load()?;
    let loan_type = LoanType::from(args.loan_type);
    let loan_amount = args.home_price - args.home_price * args.down_payment / Decimal::from(100);

    let breakdown = loan_comparison::itemize_closing_costs(
        args.home_price,
        loan_amount,
        env.rates.program(loan_type),
        &env.closing_costs,
    );
    Ok(json!({
        "result": {
            "loan_type": loan_type,
            "loan_amount": loan_amount,
            "items": breakdown.items,
            "total": breakdown.total,
        }
    }))
}

pub fn run_arm(args: ArmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let env = args.env.load()?;
    let program = &env.rates.arm;
    let initial_rate = args.initial_rate.unwrap_or(program.info.base_rate);
    let index_rate = args.index.unwrap_or(env.index_rate);

    let scenarios = loan_comparison::project_arm_scenarios(
        args.loan_amount,
        initial_rate,
        args.term,
        index_rate,
        program,
    )?;
    Ok(json!({ "result": scenarios }))
}

fn term_months(years: u32) -> Result<u32, Box<dyn std::error::Error>> {
    years
        .checked_mul(12)
        .filter(|m| *m > 0)
        .ok_or_else(|| "--term must be a positive number of years".into())
}
