//! Domain models for cloudcost.
//!
//! ## Submodules
//!
//! - [`account`] - Accounts, credentials, credential schema
//! - [`cost`] - Cost items, VM lifetimes, lifetime policy
//! - [`report`] - Report rows, failures, provider results

mod account;
mod cost;
mod report;

pub use account::{Account, CredentialField, Credentials};
pub use cost::{CostItem, DEFAULT_LIFETIME_THRESHOLD_HOURS, LifetimePolicy, VmLifetimeRecord};
pub use report::{
    FailureRecord, FailureSet, ProviderResult, Report, ReportRow, SkippedAccount,
};
