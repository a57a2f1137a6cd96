//! Provider registry mapping provider ids to adapters.
//!
//! Adapters are registered explicitly, so the set of providers is known at
//! build time and never depends on files present at runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use cloudcost_fetch::{AdapterInfo, ProviderAdapter};
use thiserror::Error;

use crate::amazon::AmazonAdapter;
use crate::azure::AzureAdapter;
use crate::cloudsigma::CloudSigmaAdapter;
use crate::digitalocean::DigitalOceanAdapter;
use crate::heroku::HerokuAdapter;
use crate::jelastic::JelasticAdapter;
use crate::ovhcloud::OvhAdapter;
use crate::rackspace::RackspaceAdapter;
use crate::softlayer::SoftLayerAdapter;

/// Lookup failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No adapter is registered under this id.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Registry of provider adapters keyed by id.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: BTreeMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in adapter.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AmazonAdapter::new()));
        registry.register(Arc::new(AzureAdapter::new()));
        registry.register(Arc::new(CloudSigmaAdapter::new()));
        registry.register(Arc::new(DigitalOceanAdapter::new()));
        registry.register(Arc::new(HerokuAdapter::new()));
        registry.register(Arc::new(OvhAdapter::new()));
        registry.register(Arc::new(RackspaceAdapter::new()));
        registry.register(Arc::new(SoftLayerAdapter::bluemix()));
        registry.register(Arc::new(SoftLayerAdapter::softlayer()));
        for adapter in JelasticAdapter::builtin() {
            registry.register(Arc::new(adapter));
        }
        registry
    }

    /// Registers an adapter, replacing any adapter with the same id.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.id().to_string(), adapter);
    }

    /// Gets an adapter by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(id).cloned()
    }

    /// Gets an adapter by id or fails with [`RegistryError::UnknownProvider`].
    ///
    /// # Errors
    ///
    /// Fails when nothing is registered under `id`.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn ProviderAdapter>, RegistryError> {
        self.get(id)
            .ok_or_else(|| RegistryError::UnknownProvider(id.to_string()))
    }

    /// Returns true if an adapter is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.adapters.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Registered adapters in id order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.adapters.values()
    }

    /// Descriptions of every adapter, for listings.
    pub fn infos(&self) -> Vec<AdapterInfo> {
        self.all()
            .map(|adapter| AdapterInfo::from_adapter(adapter.as_ref()))
            .collect()
    }

    /// Number of registered adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registers_every_provider() {
        let registry = ProviderRegistry::builtin();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(
            ids,
            vec![
                "amazon",
                "azure",
                "bluemix",
                "cloudjiffy",
                "cloudsigma",
                "cloudsigma-paas",
                "digitalocean",
                "eapps",
                "heroku",
                "layershift",
                "mamazala",
                "mirhosting",
                "ovhcloud",
                "rackspace",
                "softlayer",
                "togglebox",
            ]
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ProviderRegistry::builtin();
        assert!(registry.resolve("digitalocean").is_ok());
        assert_eq!(
            registry.resolve("nimbus").err(),
            Some(RegistryError::UnknownProvider("nimbus".to_string()))
        );
    }

    #[test]
    fn test_only_digitalocean_has_lifetime() {
        let registry = ProviderRegistry::builtin();
        let lifetime: Vec<_> = registry
            .infos()
            .into_iter()
            .filter(|info| info.lifetime)
            .map(|info| info.id)
            .collect();
        assert_eq!(lifetime, vec!["digitalocean"]);
    }

    #[test]
    fn test_every_schema_is_non_empty() {
        for adapter in ProviderRegistry::builtin().all() {
            assert!(!adapter.credential_schema().is_empty(), "{}", adapter.id());
        }
    }
}
