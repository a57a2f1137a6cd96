//! Store error types.

use thiserror::Error;

/// Errors raised by the account store and configuration loading.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Account not found.
    #[error("Account not found: {provider}/{name}")]
    AccountNotFound {
        /// Provider id.
        provider: String,
        /// Account name.
        name: String,
    },

    /// Account already exists.
    #[error("Account already exists: {provider}/{name}")]
    AccountExists {
        /// Provider id.
        provider: String,
        /// Account name.
        name: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Keychain error.
    #[error("Keychain error: {0}")]
    Keychain(String),
}

impl StoreError {
    pub(crate) fn not_found(provider: &str, name: &str) -> Self {
        Self::AccountNotFound {
            provider: provider.to_string(),
            name: name.to_string(),
        }
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}
