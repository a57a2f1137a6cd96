//! Provider adapter contract.
//!
//! One adapter exists per supported billing backend. The engine only sees
//! this trait, so adding a provider is a registry change.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cloudcost_core::{CostItem, CredentialField, Credentials, VmLifetimeRecord};
use serde::Serialize;

use crate::context::FetchContext;
use crate::error::ProviderError;

/// Lifetime records keyed by machine id.
pub type LifetimeMap = BTreeMap<String, VmLifetimeRecord>;

// ============================================================================
// Provider Adapter Trait
// ============================================================================

/// A billing backend.
///
/// ## Implementing an Adapter
///
/// ```ignore
/// const SCHEMA: &[CredentialField] = &[CredentialField::secret("api_key", "API key")];
///
/// struct FooAdapter;
///
/// #[async_trait]
/// impl ProviderAdapter for FooAdapter {
///     fn id(&self) -> &str {
///         "foo"
///     }
///
///     fn credential_schema(&self) -> &'static [CredentialField] {
///         SCHEMA
///     }
///
///     async fn cost(
///         &self,
///         ctx: &FetchContext,
///         account_name: &str,
///         credentials: &Credentials,
///     ) -> Result<Vec<CostItem>, ProviderError> {
///         let key = credentials.require("api_key")?;
///         // Query the vendor and build cost items
///     }
/// }
/// ```
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider id, the key accounts are registered under.
    fn id(&self) -> &str;

    /// Human-readable provider name.
    fn display_name(&self) -> &str {
        self.id()
    }

    /// Credential fields an account of this provider must carry.
    fn credential_schema(&self) -> &'static [CredentialField];

    /// Capability probe for [`ProviderAdapter::life`].
    ///
    /// Callers check this instead of calling `life` and inspecting the error.
    fn supports_lifetime(&self) -> bool {
        false
    }

    /// Fetches the current cost items of one account.
    ///
    /// An empty vector is a valid result and produces no report rows.
    async fn cost(
        &self,
        ctx: &FetchContext,
        account_name: &str,
        credentials: &Credentials,
    ) -> Result<Vec<CostItem>, ProviderError>;

    /// Fetches billed hours per machine.
    async fn life(
        &self,
        _ctx: &FetchContext,
        _account_name: &str,
        _credentials: &Credentials,
    ) -> Result<LifetimeMap, ProviderError> {
        Err(ProviderError::Unsupported(format!(
            "{} has no lifetime check",
            self.id()
        )))
    }
}

// ============================================================================
// Adapter Info
// ============================================================================

/// Description of an adapter (for listings).
#[derive(Debug, Clone, Serialize)]
pub struct AdapterInfo {
    /// Provider id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Whether the lifetime check is available.
    pub lifetime: bool,
    /// Credential schema.
    pub credentials: Vec<CredentialField>,
}

impl AdapterInfo {
    /// Creates info from an adapter implementation.
    pub fn from_adapter(adapter: &dyn ProviderAdapter) -> Self {
        Self {
            id: adapter.id().to_string(),
            display_name: adapter.display_name().to_string(),
            lifetime: adapter.supports_lifetime(),
            credentials: adapter.credential_schema().to_vec(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
