// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `cloudcost` Core
//!
//! Core types, models, and traits shared by every `cloudcost` crate.
//!
//! [`CostItem`] is the only value provider adapters hand back to the engine,
//! so adding a provider never touches orchestration code.
//!
//! ## Key Types
//!
//! ### Accounts
//! - [`Account`] - A billing account and its credentials
//! - [`Credentials`] - Redacted key/value secrets
//! - [`CredentialField`] - Static credential schema entry
//!
//! ### Costs
//! - [`CostItem`] - One billing period's amount
//! - [`VmLifetimeRecord`] - A long-running machine
//! - [`LifetimePolicy`] - When lifetime checks run
//!
//! ### Results
//! - [`Report`] / [`ReportRow`] - Ordered cost rows
//! - [`FailureSet`] / [`FailureRecord`] - Accounts that failed
//! - [`ProviderResult`] - Success or failure for one account

pub mod error;
pub mod models;
pub mod traits;

pub use error::CoreError;

pub use models::{
    // Accounts
    Account,
    CredentialField,
    Credentials,
    // Costs
    CostItem,
    DEFAULT_LIFETIME_THRESHOLD_HOURS,
    LifetimePolicy,
    VmLifetimeRecord,
    // Results
    FailureRecord,
    FailureSet,
    ProviderResult,
    Report,
    ReportRow,
    SkippedAccount,
};

pub use traits::{CurrencyConverter, REPORT_CURRENCY};
