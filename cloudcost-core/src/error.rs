//! Core error types for `cloudcost`.

use thiserror::Error;

/// Core error type for `cloudcost` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A credential field required by an adapter is absent.
    #[error("Missing credential field: {0}")]
    MissingCredential(String),

    /// A credential field the adapter does not declare.
    #[error("Unknown credential field: {0}")]
    UnknownCredential(String),

    /// No conversion rate is known for the currency.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Invalid data from an upstream response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
