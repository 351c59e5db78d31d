//! Loan eligibility: rule engine, dataset lookups, and the handler.

pub mod engine;
pub mod handler;
pub mod lookup;

pub use engine::{EligibilityRecord, Evaluation, FailedCheck, RemediationCategory, evaluate};
pub use handler::{Decision, EligibilityHandler, decide};
pub use lookup::{EligibilityLookup, TableLookup};
