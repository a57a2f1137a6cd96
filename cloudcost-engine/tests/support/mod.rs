//! Shared fixtures: scripted adapters, a failing store and a counting sink.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use cloudcost_core::{Account, CostItem, CredentialField, Credentials, VmLifetimeRecord};
use cloudcost_engine::{AggregationEngine, EngineSettings, MessagingSink, Notification, SinkError};
use cloudcost_fetch::{FetchContext, LifetimeMap, ProviderAdapter, ProviderError, StaticRateConverter};
use cloudcost_providers::ProviderRegistry;
use cloudcost_store::{AccountFilter, AccountStore, MemoryAccountStore, StoreError};
use rust_decimal::Decimal;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The pinned "today" of every test context.
pub fn today() -> NaiveDate {
    day(2024, 2, 1)
}

// ============================================================================
// Scripted Adapter
// ============================================================================

pub enum CostScript {
    Items(Vec<CostItem>),
    Fail(&'static str),
    Hang,
    Delay(Duration, Vec<CostItem>),
    Foreign { amount: Decimal, currency: &'static str },
}

pub enum LifeScript {
    Unsupported,
    Records(Vec<(&'static str, f64)>),
    Fail,
}

pub struct ScriptedAdapter {
    id: &'static str,
    cost: CostScript,
    life: LifeScript,
    pub cost_calls: AtomicUsize,
    pub life_calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(id: &'static str, cost: CostScript) -> Self {
        Self {
            id,
            cost,
            life: LifeScript::Unsupported,
            cost_calls: AtomicUsize::new(0),
            life_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_life(mut self, life: LifeScript) -> Self {
        self.life = life;
        self
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn id(&self) -> &str {
        self.id
    }

    fn credential_schema(&self) -> &'static [CredentialField] {
        &[]
    }

    fn supports_lifetime(&self) -> bool {
        !matches!(self.life, LifeScript::Unsupported)
    }

    async fn cost(
        &self,
        ctx: &FetchContext,
        _account_name: &str,
        _credentials: &Credentials,
    ) -> Result<Vec<CostItem>, ProviderError> {
        self.cost_calls.fetch_add(1, Ordering::SeqCst);
        match &self.cost {
            CostScript::Items(items) => Ok(items.clone()),
            CostScript::Fail(msg) => Err(ProviderError::InvalidResponse((*msg).to_string())),
            CostScript::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
            CostScript::Delay(delay, items) => {
                tokio::time::sleep(*delay).await;
                Ok(items.clone())
            }
            CostScript::Foreign { amount, currency } => {
                let usd = ctx.currency.to_report_currency(*amount, currency)?;
                Ok(vec![CostItem::new(usd, None, None)])
            }
        }
    }

    async fn life(
        &self,
        _ctx: &FetchContext,
        account_name: &str,
        _credentials: &Credentials,
    ) -> Result<LifetimeMap, ProviderError> {
        self.life_calls.fetch_add(1, Ordering::SeqCst);
        match &self.life {
            LifeScript::Records(records) => Ok(records
                .iter()
                .map(|(name, hours)| {
                    (
                        (*name).to_string(),
                        VmLifetimeRecord {
                            vm_name: (*name).to_string(),
                            hours_alive: *hours,
                            provider: self.id.to_string(),
                            account: account_name.to_string(),
                            bill: "inv-1".to_string(),
                        },
                    )
                })
                .collect()),
            LifeScript::Fail => Err(ProviderError::InvalidResponse("invoice api down".to_string())),
            LifeScript::Unsupported => Err(ProviderError::Unsupported(self.id.to_string())),
        }
    }
}

// ============================================================================
// Engine Fixtures
// ============================================================================

pub fn account(provider: &str, name: &str, order: i64) -> Account {
    Account::new(provider, name, Credentials::new()).with_sort_order(order)
}

pub fn context() -> Arc<FetchContext> {
    let converter = StaticRateConverter::new().with_rate("GBP", Decimal::new(125, 2));
    Arc::new(
        FetchContext::builder()
            .today(today())
            .currency(Arc::new(converter))
            .build(),
    )
}

pub fn engine(
    accounts: Vec<Account>,
    adapters: Vec<Arc<ScriptedAdapter>>,
    settings: EngineSettings,
) -> AggregationEngine {
    let mut registry = ProviderRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    AggregationEngine::new(
        Arc::new(MemoryAccountStore::with_accounts(accounts)),
        Arc::new(registry),
        context(),
        settings,
    )
}

// ============================================================================
// Unreachable Store
// ============================================================================

pub struct UnreachableStore;

fn unreachable() -> StoreError {
    StoreError::Config("database is locked".to_string())
}

impl AccountStore for UnreachableStore {
    fn list_accounts(&self, _filter: &AccountFilter) -> Result<Vec<Account>, StoreError> {
        Err(unreachable())
    }

    fn get_account(&self, _provider: &str, _name: &str) -> Result<Account, StoreError> {
        Err(unreachable())
    }

    fn add_account(&self, _account: &Account) -> Result<(), StoreError> {
        Err(unreachable())
    }

    fn update_credentials(&self, _provider: &str, _name: &str, _credentials: &Credentials) -> Result<(), StoreError> {
        Err(unreachable())
    }

    fn set_enabled(&self, _provider: &str, _name: &str, _enabled: bool) -> Result<(), StoreError> {
        Err(unreachable())
    }

    fn remove_account(&self, _provider: &str, _name: &str) -> Result<(), StoreError> {
        Err(unreachable())
    }

    fn set_order(&self, _order: &[(String, String)]) -> Result<(), StoreError> {
        Err(unreachable())
    }
}

// ============================================================================
// Counting Sink
// ============================================================================

/// Records every call. The first `failures` calls fail.
#[derive(Default)]
pub struct CountingSink {
    failures: AtomicU32,
    fail_forever: bool,
    pub uploads: AtomicUsize,
    pub posts: AtomicUsize,
    pub messages: Mutex<Vec<String>>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(times: u32) -> Self {
        Self {
            failures: AtomicU32::new(times),
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            fail_forever: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst) + self.posts.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        self.fail_forever
            || self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

#[async_trait]
impl MessagingSink for CountingSink {
    async fn upload_artifact(&self, _path: &Path) -> Result<String, SinkError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.should_fail() {
            return Err(SinkError::InvalidResponse("upload rejected".to_string()));
        }
        Ok("file-1".to_string())
    }

    async fn post_notification(&self, notification: &Notification) -> Result<(), SinkError> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail() {
            return Err(SinkError::InvalidResponse("post rejected".to_string()));
        }
        self.messages.lock().unwrap().push(notification.message.clone());
        Ok(())
    }
}
