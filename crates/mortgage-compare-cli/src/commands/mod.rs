pub mod compare;
pub mod loan;
pub mod property;
pub mod report;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use mortgage_compare_core::loan_comparison::{
    CreditScoreBucket, LoanInputs, LoanType, PmiCancellationMethod, RateEnvironment,
};

use crate::input;

/// Borrower inputs shared by every command that prices the five programs.
#[derive(Args)]
pub struct LoanInputArgs {
    /// Home purchase price
    #[arg(long)]
    pub home_price: Option<Decimal>,

    /// Down payment as a percent of the price (e.g. 20 = 20%)
    #[arg(long, alias = "down")]
    pub down_payment: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value_t = 30)]
    pub term: u32,

    /// Credit score bucket: 760+, 720-759, 680-719, 660-679, 620-659, <620
    #[arg(long, default_value = "720-759")]
    pub credit_score: CreditScoreBucket,

    /// Discount points purchased (each costs 1% of the loan)
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub points: Decimal,

    /// Seller credit as a percent of the price
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub seller_credit: Decimal,
}

impl LoanInputArgs {
    pub fn to_inputs(&self) -> Result<LoanInputs, Box<dyn std::error::Error>> {
        let home_price = self
            .home_price
            .ok_or("--home-price is required (or provide --input)")?;
        Ok(self.with_home_price(home_price))
    }

    pub fn with_home_price(&self, home_price: Decimal) -> LoanInputs {
        LoanInputs {
            home_price,
            down_payment_percent: self.down_payment.unwrap_or(Decimal::from(20)),
            loan_term_years: self.term,
            credit_score: self.credit_score,
            discount_points: self.points,
            seller_credit_percent: self.seller_credit,
        }
    }
}

/// Reference data and clock overrides.
#[derive(Args)]
pub struct EnvironmentArgs {
    /// Rate environment file (JSON, or YAML by extension)
    #[arg(long)]
    pub rates: Option<String>,

    /// Pricing date used for mortgage insurance end dates (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// How conventional PMI cancellation is estimated
    #[arg(long, value_enum)]
    pub pmi_method: Option<PmiMethodArg>,
}

impl EnvironmentArgs {
    pub fn load(&self) -> Result<RateEnvironment, Box<dyn std::error::Error>> {
        self.load_or(None)
    }

    /// A `--rates` file wins over `fallback`; the built-in environment is
    /// used when neither is given.
    pub fn load_or(
        &self,
        fallback: Option<RateEnvironment>,
    ) -> Result<RateEnvironment, Box<dyn std::error::Error>> {
        let mut env = match (&self.rates, fallback) {
            (Some(path), _) => input::file::read_rate_environment(path)?,
            (None, Some(env)) => env,
            (None, None) => RateEnvironment::default(),
        };
        if let Some(method) = self.pmi_method {
            env.pmi_cancellation = method.into();
        }
        env.validate()?;
        Ok(env)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PmiMethodArg {
    ScheduleWalk,
    DecayApproximation,
}

impl From<PmiMethodArg> for PmiCancellationMethod {
    fn from(arg: PmiMethodArg) -> Self {
        match arg {
            PmiMethodArg::ScheduleWalk => PmiCancellationMethod::ScheduleWalk,
            PmiMethodArg::DecayApproximation => PmiCancellationMethod::DecayApproximation,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LoanTypeArg {
    Conventional,
    Fha,
    Va,
    Usda,
    Arm,
}

impl From<LoanTypeArg> for LoanType {
    fn from(arg: LoanTypeArg) -> Self {
        match arg {
            LoanTypeArg::Conventional => LoanType::Conventional,
            LoanTypeArg::Fha => LoanType::Fha,
            LoanTypeArg::Va => LoanType::Va,
            LoanTypeArg::Usda => LoanType::Usda,
            LoanTypeArg::Arm => LoanType::Arm,
        }
    }
}
