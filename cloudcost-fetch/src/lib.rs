// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `cloudcost` Fetch
//!
//! The provider adapter contract and the host services adapters use.
//!
//! ## Host Services
//!
//! - [`host::http`] - HTTP client with tracing and JSON helpers
//! - [`host::process`] - Subprocess execution for vendor CLIs
//! - [`currency`] - Rate-table currency conversion
//!
//! ## Adapter Contract
//!
//! - [`adapter::ProviderAdapter`] - Cost and optional lifetime capability
//! - [`context::FetchContext`] - Host services handed to each call
//! - [`retry::RetryPolicy`] - Bounded immediate retry for deliveries

pub mod adapter;
pub mod context;
pub mod currency;
pub mod dates;
pub mod error;
pub mod host;
pub mod retry;

// Errors
pub use error::{HttpError, ProcessError, ProviderError};

// Host services
pub use currency::StaticRateConverter;
pub use host::{
    http::{bearer, HttpClient, AUTHORIZATION},
    process::{ProcessOutput, ProcessRunner},
};

// Adapter contract
pub use adapter::{AdapterInfo, LifetimeMap, ProviderAdapter};
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use retry::{RetryDecision, RetryExhausted, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
