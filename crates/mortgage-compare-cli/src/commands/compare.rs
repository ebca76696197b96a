use clap::Args;
use serde_json::Value;

use mortgage_compare_core::loan_comparison::{self, ComparisonRequest, LoanInputs};

use super::{EnvironmentArgs, LoanInputArgs};
use crate::input;

/// Arguments for the five-program comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    /// Path to JSON input file with the borrower inputs (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanInputArgs,

    #[command(flatten)]
    pub env: EnvironmentArgs,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: LoanInputs = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        args.loan.to_inputs()?
    };

    let request = ComparisonRequest {
        inputs,
        environment: args.env.load()?,
        as_of: args.env.as_of,
    };
    log::debug!("comparing programs for home price {}", request.inputs.home_price);

    let result = loan_comparison::run_comparison(&request)?;
    Ok(serde_json::to_value(result)?)
}
