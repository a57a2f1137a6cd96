//! Microsoft Azure provider implementation.
//!
//! Authenticates with a service principal (client credentials) and sums
//! pay-as-you-go usage details of the current billing period.

mod adapter;
mod api;

pub use adapter::AzureAdapter;
