//! Side-by-side pricing of the five mortgage programs.
//!
//! Leaves first: [`rate_table`] supplies the injected reference data,
//! [`mortgage_insurance`], [`closing_costs`] and [`arm`] price the pieces,
//! and [`compare`] assembles one [`LoanResult`] per program.

pub mod arm;
pub mod closing_costs;
pub mod compare;
pub mod mortgage_insurance;
pub mod rate_table;

pub use arm::{project_arm_scenarios, ArmScenarios, ScenarioPayment};
pub use closing_costs::{closing_costs, itemize_closing_costs, ClosingCostSchedule};
pub use compare::{
    compare_loans, run_comparison, ComparisonMetric, ComparisonRequest, LoanComparison,
    LoanInputs, LoanResult, LoanResults,
};
pub use mortgage_insurance::{MortgageInsurance, PmiCancellationMethod};
pub use rate_table::{CreditScoreBucket, LoanProgram, LoanType, RateEnvironment, RateTable};
