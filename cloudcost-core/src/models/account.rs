//! Account and credential types.
//!
//! - [`Account`] - A billing account registered for a provider
//! - [`Credentials`] - Opaque key/value secrets handed to an adapter
//! - [`CredentialField`] - One entry of an adapter's credential schema

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

// ============================================================================
// Credentials
// ============================================================================

/// Credential values for one account, keyed by schema field name.
///
/// `Debug` output never contains the values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    /// Creates an empty credential map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Returns a field value if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns a field value or a [`CoreError::MissingCredential`].
    ///
    /// # Errors
    ///
    /// Fails when the field is absent.
    pub fn require(&self, field: &str) -> Result<&str, CoreError> {
        self.get(field)
            .ok_or_else(|| CoreError::MissingCredential(field.to_string()))
    }

    /// Returns the field names in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks these credentials against an adapter schema.
    ///
    /// Every schema field must be present and no other field may be set.
    ///
    /// # Errors
    ///
    /// Returns the first missing or unknown field.
    pub fn validate(&self, schema: &[CredentialField]) -> Result<(), CoreError> {
        for field in schema {
            self.require(field.name)?;
        }
        if let Some(unknown) = self.fields().find(|k| !schema.iter().any(|f| f.name == *k)) {
            return Err(CoreError::UnknownCredential(unknown.to_string()));
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "<redacted>")))
            .finish()
    }
}

// ============================================================================
// Credential Schema
// ============================================================================

/// One credential field an adapter needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialField {
    /// Key in [`Credentials`].
    pub name: &'static str,
    /// Human-readable label for prompts.
    pub label: &'static str,
    /// Whether the value is a secret (masked when entered or shown).
    pub sensitive: bool,
}

impl CredentialField {
    /// A non-secret field such as a subscription id.
    pub const fn public(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            sensitive: false,
        }
    }

    /// A secret field such as an API key.
    pub const fn secret(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            sensitive: true,
        }
    }
}

// ============================================================================
// Account
// ============================================================================

/// A billing account as stored in the account store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Provider id the account belongs to.
    pub provider: String,
    /// Account name, unique per provider.
    pub name: String,
    /// Credentials for the provider's adapter.
    pub credentials: Credentials,
    /// Disabled accounts are skipped during runs.
    pub enabled: bool,
    /// Persisted position in run order.
    pub sort_order: i64,
}

impl Account {
    /// Creates an enabled account with sort order 0.
    pub fn new(provider: impl Into<String>, name: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            provider: provider.into(),
            name: name.into(),
            credentials,
            enabled: true,
            sort_order: 0,
        }
    }

    /// Sets the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Returns `provider/name`, used in log lines.
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider, self.name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &[CredentialField] = &[
        CredentialField::public("client_id", "Client ID"),
        CredentialField::secret("password", "Client secret"),
    ];

    #[test]
    fn test_debug_redacts_values() {
        let creds: Credentials = [("password", "hunter2")].into_iter().collect();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("password"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_require_missing_field() {
        let creds = Credentials::new();
        assert!(matches!(
            creds.require("api_key"),
            Err(CoreError::MissingCredential(f)) if f == "api_key"
        ));
    }

    #[test]
    fn test_validate_against_schema() {
        let ok: Credentials = [("client_id", "abc"), ("password", "s3cret")].into_iter().collect();
        assert!(ok.validate(SCHEMA).is_ok());

        let missing: Credentials = [("client_id", "abc")].into_iter().collect();
        assert!(matches!(missing.validate(SCHEMA), Err(CoreError::MissingCredential(_))));

        let extra: Credentials = [("client_id", "abc"), ("password", "x"), ("tenant", "t")]
            .into_iter()
            .collect();
        assert!(matches!(extra.validate(SCHEMA), Err(CoreError::UnknownCredential(f)) if f == "tenant"));
    }

    #[test]
    fn test_account_defaults() {
        let account = Account::new("heroku", "main", Credentials::new());
        assert!(account.enabled);
        assert_eq!(account.sort_order, 0);
        assert_eq!(account.label(), "heroku/main");
    }
}
