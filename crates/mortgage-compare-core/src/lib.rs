pub mod amortization;
pub mod error;
pub mod loan_comparison;
pub mod types;

#[cfg(any(feature = "report", feature = "property"))]
pub mod lead;

pub use error::MortgageError;
pub use types::*;

/// Standard result type for all mortgage-compare operations
pub type MortgageResult<T> = Result<T, MortgageError>;
