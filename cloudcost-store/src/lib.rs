// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `cloudcost` Store
//!
//! Account storage and configuration.
//!
//! ## Features
//!
//! - **Account store**: [`AccountStore`] trait with SQLite and in-memory backends
//! - **Configuration**: TOML [`Config`] with defaults for every key
//! - **Keychain**: Mattermost token lookup in the system keychain
//! - **Security**: Database files are created with 0600 permissions on Unix

pub mod account_store;
pub mod config;
pub mod error;
pub mod keychain;
pub mod paths;
pub mod sqlite;

pub use account_store::{AccountFilter, AccountStore, MemoryAccountStore};
pub use config::{
    Config, CurrencyConfig, DatabaseConfig, DeliveryConfig, EngineConfig, ExportConfig, MattermostConfig,
};
pub use error::StoreError;
pub use paths::{default_config_dir, default_config_path, default_data_dir, default_database_path};
pub use sqlite::SqliteAccountStore;
