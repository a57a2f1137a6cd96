//! Aggregation engine.
//!
//! A run lists accounts from the store once, dispatches each enabled account
//! to its adapter and folds the outcomes back in store order. Every account
//! ends up in exactly one of: report, failure set, skipped list.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use cloudcost_core::{
    Account, FailureSet, LifetimePolicy, ProviderResult, Report, SkippedAccount, VmLifetimeRecord,
    DEFAULT_LIFETIME_THRESHOLD_HOURS,
};
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use cloudcost_providers::ProviderRegistry;
use cloudcost_store::{AccountFilter, AccountStore, EngineConfig};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{DispatchError, EngineError};

// ============================================================================
// Settings
// ============================================================================

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Accounts dispatched at once. 1 means strictly sequential.
    pub concurrency: usize,
    /// Per-call limit for `cost()` and `life()`.
    pub call_timeout: Option<Duration>,
    /// When `life()` runs during a cost run.
    pub lifetime_policy: LifetimePolicy,
    /// Hours after which a machine is an anomaly.
    pub lifetime_threshold_hours: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            call_timeout: Some(Duration::from_secs(120)),
            lifetime_policy: LifetimePolicy::default(),
            lifetime_threshold_hours: DEFAULT_LIFETIME_THRESHOLD_HOURS,
        }
    }
}

impl EngineSettings {
    /// Builds settings from the `[engine]` config section.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            call_timeout: (config.call_timeout_secs > 0).then(|| Duration::from_secs(config.call_timeout_secs)),
            lifetime_policy: config.lifetime_policy,
            lifetime_threshold_hours: config.lifetime_threshold_hours,
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a cost run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutcome {
    /// Cost rows in account order.
    pub report: Report,
    /// Accounts that failed to report.
    pub failures: FailureSet,
    /// Machines over the lifetime threshold.
    pub anomalies: Vec<VmLifetimeRecord>,
    /// Disabled accounts.
    pub skipped: Vec<SkippedAccount>,
    /// Accounts whose cost call succeeded, including those with no items.
    pub succeeded: usize,
    /// Accounts returned by the store.
    pub accounts_seen: usize,
    /// Wall time of the run.
    #[serde(skip)]
    pub duration: Duration,
}

impl RunOutcome {
    /// Returns true if every account is accounted for exactly once.
    pub fn is_complete(&self) -> bool {
        self.succeeded + self.failures.len() + self.skipped.len() == self.accounts_seen
    }
}

/// Result of a lifetime-only run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LifetimeOutcome {
    /// Machines over the lifetime threshold.
    pub anomalies: Vec<VmLifetimeRecord>,
    /// Accounts whose adapter was asked.
    pub checked: usize,
    /// Accounts whose check failed.
    pub errors: usize,
    /// Disabled accounts.
    pub skipped: Vec<SkippedAccount>,
}

/// Accounts listed for one run.
struct AccountSnapshot {
    enabled: Vec<Account>,
    skipped: Vec<SkippedAccount>,
    seen: usize,
}

/// One dispatched account.
struct AccountRun {
    result: ProviderResult,
    lifetimes: Vec<VmLifetimeRecord>,
}

// ============================================================================
// Engine
// ============================================================================

/// Dispatches accounts to adapters and collects the results.
pub struct AggregationEngine {
    store: Arc<dyn AccountStore>,
    registry: Arc<ProviderRegistry>,
    ctx: Arc<FetchContext>,
    settings: EngineSettings,
}

impl AggregationEngine {
    /// Creates an engine.
    pub fn new(
        store: Arc<dyn AccountStore>,
        registry: Arc<ProviderRegistry>,
        ctx: Arc<FetchContext>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            registry,
            ctx,
            settings,
        }
    }

    /// Engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The day used for billing-cycle decisions.
    pub fn today(&self) -> NaiveDate {
        self.ctx.today()
    }

    /// Runs the cost check for every matching account.
    ///
    /// # Errors
    ///
    /// Only a store failure escapes. Per-account errors become failure records.
    #[instrument(skip(self))]
    pub async fn run(&self, filter: &AccountFilter) -> Result<RunOutcome, EngineError> {
        let start = Instant::now();
        let today = self.today();
        let AccountSnapshot { enabled, skipped, seen } = self.fetch_accounts(filter)?;

        info!(
            accounts = seen,
            enabled = enabled.len(),
            concurrency = self.settings.concurrency,
            "Starting cost run"
        );

        let runs: Vec<AccountRun> = stream::iter(enabled)
            .map(|account| self.dispatch(account, today))
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut outcome = RunOutcome {
            skipped,
            accounts_seen: seen,
            ..RunOutcome::default()
        };
        for run in runs {
            match run.result {
                ProviderResult::Success { account, items } => {
                    outcome.report.append(&account.provider, &account.name, &items);
                    outcome.succeeded += 1;
                }
                ProviderResult::Failure { account, error } => {
                    outcome.failures.record(&account.provider, &account.name, error);
                }
            }
            outcome.anomalies.extend(
                run.lifetimes
                    .into_iter()
                    .filter(|r| r.exceeds(self.settings.lifetime_threshold_hours)),
            );
        }
        outcome.duration = start.elapsed();

        info!(
            rows = outcome.report.len(),
            failures = outcome.failures.len(),
            anomalies = outcome.anomalies.len(),
            skipped = outcome.skipped.len(),
            duration_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            "Cost run finished"
        );
        Ok(outcome)
    }

    /// Runs the lifetime check on every matching account whose adapter
    /// supports it, regardless of the lifetime policy.
    ///
    /// # Errors
    ///
    /// Only a store failure escapes.
    #[instrument(skip(self))]
    pub async fn run_lifetime(&self, filter: &AccountFilter) -> Result<LifetimeOutcome, EngineError> {
        let AccountSnapshot { enabled, skipped, .. } = self.fetch_accounts(filter)?;

        let candidates: Vec<(Arc<dyn ProviderAdapter>, Account)> = enabled
            .into_iter()
            .filter_map(|account| match self.registry.get(&account.provider) {
                Some(adapter) if adapter.supports_lifetime() => Some((adapter, account)),
                Some(_) => None,
                None => {
                    warn!(account = %account.label(), "Unknown provider, skipping lifetime check");
                    None
                }
            })
            .collect();

        info!(accounts = candidates.len(), "Starting lifetime run");

        let results: Vec<Option<Vec<VmLifetimeRecord>>> = stream::iter(candidates)
            .map(|(adapter, account)| async move { self.check_lifetime(adapter.as_ref(), &account).await })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut outcome = LifetimeOutcome {
            skipped,
            checked: results.len(),
            ..LifetimeOutcome::default()
        };
        for records in results {
            match records {
                Some(records) => outcome.anomalies.extend(
                    records
                        .into_iter()
                        .filter(|r| r.exceeds(self.settings.lifetime_threshold_hours)),
                ),
                None => outcome.errors += 1,
            }
        }

        info!(
            checked = outcome.checked,
            errors = outcome.errors,
            anomalies = outcome.anomalies.len(),
            "Lifetime run finished"
        );
        Ok(outcome)
    }

    /// Lists accounts and splits off disabled ones. The store is only
    /// touched here.
    fn fetch_accounts(&self, filter: &AccountFilter) -> Result<AccountSnapshot, EngineError> {
        let accounts = self.store.list_accounts(filter)?;
        let seen = accounts.len();

        let mut enabled = Vec::with_capacity(seen);
        let mut skipped = Vec::new();
        for account in accounts {
            if account.enabled {
                enabled.push(account);
            } else {
                debug!(account = %account.label(), "Account disabled, skipping");
                skipped.push(SkippedAccount {
                    provider: account.provider,
                    account: account.name,
                });
            }
        }
        Ok(AccountSnapshot { enabled, skipped, seen })
    }

    #[instrument(skip(self, account), fields(account = %account.label()))]
    async fn dispatch(&self, account: Account, today: NaiveDate) -> AccountRun {
        let adapter = match self.registry.resolve(&account.provider) {
            Ok(adapter) => adapter,
            Err(e) => return Self::failed(account, &DispatchError::from(e)),
        };

        let cost = self
            .limited(adapter.cost(&self.ctx, &account.name, &account.credentials))
            .await;
        let items = match cost {
            Ok(items) => items,
            Err(e) => return Self::failed(account, &e),
        };
        debug!(items = items.len(), "Cost fetched");

        let lifetimes = if adapter.supports_lifetime() && self.settings.lifetime_policy.should_check(&items, today) {
            self.check_lifetime(adapter.as_ref(), &account)
                .await
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        AccountRun {
            result: ProviderResult::Success { account, items },
            lifetimes,
        }
    }

    /// Calls `life()` in isolation. Errors are logged and yield `None`.
    async fn check_lifetime(&self, adapter: &dyn ProviderAdapter, account: &Account) -> Option<Vec<VmLifetimeRecord>> {
        match self
            .limited(adapter.life(&self.ctx, &account.name, &account.credentials))
            .await
        {
            Ok(records) => {
                debug!(account = %account.label(), machines = records.len(), "Lifetime fetched");
                Some(records.into_values().collect())
            }
            Err(e) => {
                warn!(account = %account.label(), error = %e, "Lifetime check failed");
                None
            }
        }
    }

    async fn limited<T>(&self, call: impl Future<Output = Result<T, ProviderError>>) -> Result<T, DispatchError> {
        match self.settings.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| DispatchError::Timeout(limit))?
                .map_err(DispatchError::from),
            None => call.await.map_err(DispatchError::from),
        }
    }

    fn failed(account: Account, error: &DispatchError) -> AccountRun {
        warn!(account = %account.label(), error = %error, "Account failed to report");
        AccountRun {
            result: ProviderResult::Failure {
                account,
                error: error.to_string(),
            },
            lifetimes: Vec::new(),
        }
    }
}

impl std::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
