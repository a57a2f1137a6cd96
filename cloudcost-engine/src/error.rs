//! Engine error types.

use std::fmt;
use std::time::Duration;

use cloudcost_fetch::{HttpError, ProviderError};
use cloudcost_providers::RegistryError;
use cloudcost_store::StoreError;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Engine Error
// ============================================================================

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The account store could not be read. Nothing was dispatched.
    #[error("Account store unavailable: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// Dispatch Error
// ============================================================================

/// Per-account failure. Always converted into a failure record.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No adapter is registered for the account's provider.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The adapter call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The adapter call did not finish in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProvider(id) => DispatchError::UnknownProvider(id),
        }
    }
}

// ============================================================================
// Export Error
// ============================================================================

/// Failure writing the CSV export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// ============================================================================
// Sink Error
// ============================================================================

/// Failure of a single messaging-sink call.
#[derive(Debug, Error)]
pub enum SinkError {
    /// HTTP error.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The sink answered with something unusable.
    #[error("Invalid sink response: {0}")]
    InvalidResponse(String),

    /// The artifact could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No artifact was written for this run, so nothing was uploaded.
    #[error("Export unavailable: {0}")]
    ArtifactUnavailable(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        SinkError::Http(HttpError::Request(err))
    }
}

// ============================================================================
// Delivery Error
// ============================================================================

/// A delivery target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTarget {
    /// Failure notification.
    Failures,
    /// Long-running machine notification.
    Anomalies,
    /// Export artifact upload.
    Upload,
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Failures => "failures",
            Self::Anomalies => "anomalies",
            Self::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// One delivery target exhausted its retries.
#[derive(Debug, Error)]
#[error("Delivery of {target} failed after {attempts} attempts: {source}")]
pub struct DeliveryError {
    /// The target that failed.
    pub target: DeliveryTarget,
    /// Attempts made.
    pub attempts: u32,
    /// Error of the last attempt.
    pub source: SinkError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_becomes_unknown_provider() {
        let err: DispatchError = RegistryError::UnknownProvider("gcp".to_string()).into();
        assert_eq!(err.to_string(), "Unknown provider: gcp");
    }

    #[test]
    fn test_timeout_message() {
        let err = DispatchError::Timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "Timed out after 120s");
    }

    #[test]
    fn test_delivery_error_message() {
        let err = DeliveryError {
            target: DeliveryTarget::Upload,
            attempts: 5,
            source: SinkError::InvalidResponse("no file id".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Delivery of upload failed after 5 attempts: Invalid sink response: no file id"
        );
    }
}
