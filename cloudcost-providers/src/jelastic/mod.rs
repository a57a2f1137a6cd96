//! Jelastic-based PaaS providers.
//!
//! Many hosting companies resell the Jelastic platform. They share one
//! billing API and differ in host and billing currency.

mod adapter;
mod api;

pub use adapter::{JelasticAdapter, JelasticHost, HOSTS};
