//! Configuration management.
//!
//! Configuration is a TOML file. Every section and key is optional.
//!
//! ```toml
//! [database]
//! path = "/var/lib/cloudcost/accounts.db"
//!
//! [mattermost]
//! server = "https://chat.example.com"
//! channel_id = "abc123"
//! # token falls back to the keychain entry ("cloudcost", "mattermost")
//!
//! [engine]
//! concurrency = 4
//! call_timeout_secs = 120
//! lifetime_policy = "billing_cycle_start"
//! lifetime_threshold_hours = 168.0
//!
//! [delivery]
//! max_attempts = 5
//!
//! [export]
//! dir = "/tmp"
//!
//! [currency.rates]
//! GBP = "1.27"
//! EUR = "1.08"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use cloudcost_core::{LifetimePolicy, DEFAULT_LIFETIME_THRESHOLD_HOURS};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::keychain;
use crate::paths::{default_config_path, default_database_path};

/// Keychain user holding the Mattermost token.
pub const MATTERMOST_KEYCHAIN_USER: &str = "mattermost";

// ============================================================================
// Config
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account database settings.
    pub database: DatabaseConfig,
    /// Messaging sink settings. Without them nothing is delivered.
    pub mattermost: Option<MattermostConfig>,
    /// Aggregation engine settings.
    pub engine: EngineConfig,
    /// Delivery retry settings.
    pub delivery: DeliveryConfig,
    /// Export artifact settings.
    pub export: ExportConfig,
    /// Currency conversion rates.
    pub currency: CurrencyConfig,
}

/// Account database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to the data directory.
    pub path: Option<PathBuf>,
}

/// Mattermost server and channel.
#[derive(Clone, Serialize, Deserialize)]
pub struct MattermostConfig {
    /// Server base URL.
    pub server: String,
    /// Channel posts go to.
    pub channel_id: String,
    /// Bot token. Read from the keychain when absent.
    #[serde(default)]
    pub token: Option<String>,
}

impl MattermostConfig {
    /// Returns the configured token or the keychain entry.
    ///
    /// # Errors
    ///
    /// Fails when neither is available.
    pub fn resolve_token(&self) -> Result<String, StoreError> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(token.clone());
        }
        keychain::get_secret(MATTERMOST_KEYCHAIN_USER).ok_or_else(|| {
            StoreError::Config("no Mattermost token configured or stored in the keychain".to_string())
        })
    }
}

impl fmt::Debug for MattermostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MattermostConfig")
            .field("server", &self.server)
            .field("channel_id", &self.channel_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Aggregation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accounts dispatched at once. 1 means strictly sequential.
    pub concurrency: usize,
    /// Per-call timeout for adapter calls, in seconds. 0 disables it.
    pub call_timeout_secs: u64,
    /// When the lifetime check runs during a cost run.
    pub lifetime_policy: LifetimePolicy,
    /// Hours after which a machine is reported.
    pub lifetime_threshold_hours: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            call_timeout_secs: 120,
            lifetime_policy: LifetimePolicy::default(),
            lifetime_threshold_hours: DEFAULT_LIFETIME_THRESHOLD_HOURS,
        }
    }
}

/// Delivery retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Attempts per delivery target.
    pub max_attempts: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

/// Export artifact settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the CSV is written to. Defaults to the system temp dir.
    pub dir: Option<PathBuf>,
}

/// Currency conversion rates, in USD per unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// ISO code to rate.
    pub rates: BTreeMap<String, Decimal>,
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on invalid TOML or invalid values.
    pub fn from_toml(text: &str) -> Result<Self, StoreError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        debug!(path = %path.display(), "Loading config");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Loads configuration, falling back to defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] naming the offending key.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.engine.concurrency == 0 {
            return Err(StoreError::Config("engine.concurrency must be at least 1".to_string()));
        }
        if self.engine.lifetime_threshold_hours.is_nan() || self.engine.lifetime_threshold_hours < 0.0 {
            return Err(StoreError::Config(
                "engine.lifetime_threshold_hours must be non-negative".to_string(),
            ));
        }
        if self.delivery.max_attempts == 0 {
            return Err(StoreError::Config("delivery.max_attempts must be at least 1".to_string()));
        }
        if let Some((code, _)) = self.currency.rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(StoreError::Config(format!("currency.rates.{code} must be positive")));
        }
        Ok(())
    }

    /// Account database path.
    pub fn database_path(&self) -> PathBuf {
        self.database.path.clone().unwrap_or_else(default_database_path)
    }

    /// Export directory.
    pub fn export_dir(&self) -> PathBuf {
        self.export.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

// ============================================================================
// Tests
// ============================================================================
