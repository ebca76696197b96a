//! Collaborators around the calculator: listing lookup feeding the home
//! price in, and the lead report carrying results out.

#[cfg(feature = "property")]
pub mod property;

#[cfg(feature = "report")]
pub mod report;
