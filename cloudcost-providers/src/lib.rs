// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `cloudcost` Providers
//!
//! Billing adapters for every supported provider.
//!
//! ## Supported Providers
//!
//! | Provider | Source | Lifetime |
//! |----------|--------|----------|
//! | Amazon Web Services | `aws ce` CLI | ❌ |
//! | Microsoft Azure | Consumption API | ❌ |
//! | CloudSigma | Ledger API | ❌ |
//! | DigitalOcean | Balance + invoices | ✅ |
//! | Heroku | Invoices | ❌ |
//! | OVHcloud | Signed consumption API | ❌ |
//! | Rackspace | Estimated charges | ❌ |
//! | IBM Bluemix / SoftLayer | SoftLayer account API | ❌ |
//! | Jelastic resellers (7) | Jelastic billing API | ❌ |
//!
//! ## Usage
//!
//! ```ignore
//! use cloudcost_providers::ProviderRegistry;
//! use cloudcost_fetch::FetchContext;
//!
//! let registry = ProviderRegistry::builtin();
//! let adapter = registry.resolve("digitalocean")?;
//! let items = adapter.cost(&FetchContext::new(), "ops", &credentials).await?;
//! ```

pub mod registry;

// Provider modules (alphabetical)
pub mod amazon;
pub mod azure;
pub mod cloudsigma;
pub mod digitalocean;
pub mod heroku;
pub mod jelastic;
pub mod ovhcloud;
pub mod rackspace;
pub mod softlayer;

pub use registry::{ProviderRegistry, RegistryError};

pub use amazon::AmazonAdapter;
pub use azure::AzureAdapter;
pub use cloudsigma::CloudSigmaAdapter;
pub use digitalocean::DigitalOceanAdapter;
pub use heroku::HerokuAdapter;
pub use jelastic::{JelasticAdapter, JelasticHost};
pub use ovhcloud::OvhAdapter;
pub use rackspace::RackspaceAdapter;
pub use softlayer::{CategoryFilter, SoftLayerAdapter};
