//! Billing cost types.
//!
//! - [`CostItem`] - One billing period's amount for an account
//! - [`VmLifetimeRecord`] - A machine billed for a number of hours
//! - [`LifetimePolicy`] - When the lifetime check runs during a cost run

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hours after which a billed machine is reported (seven days).
pub const DEFAULT_LIFETIME_THRESHOLD_HOURS: f64 = 168.0;

// ============================================================================
// Cost Item
// ============================================================================

/// One billing period's amount for an account.
///
/// An adapter may return several items per run, e.g. the running cycle
/// plus the previous invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    /// Amount in the report currency.
    pub amount: Decimal,
    /// First day of the billing period, if the provider reports it.
    pub period_start: Option<NaiveDate>,
    /// Last day (exclusive) of the billing period, if known.
    pub period_end: Option<NaiveDate>,
    /// Provider-formatted account balance, e.g. `"12.50 USD"`.
    pub balance: Option<String>,
}

impl CostItem {
    /// Creates an item without a balance.
    pub fn new(amount: Decimal, period_start: Option<NaiveDate>, period_end: Option<NaiveDate>) -> Self {
        Self {
            amount,
            period_start,
            period_end,
            balance: None,
        }
    }

    /// Attaches a balance string.
    #[must_use]
    pub fn with_balance(mut self, balance: impl Into<String>) -> Self {
        self.balance = Some(balance.into());
        self
    }

    /// Returns true if this item's period starts on `day`.
    pub fn starts_on(&self, day: NaiveDate) -> bool {
        self.period_start == Some(day)
    }
}

// ============================================================================
// VM Lifetime
// ============================================================================

/// A virtual machine and the hours it was billed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmLifetimeRecord {
    /// Machine name as shown by the provider.
    pub vm_name: String,
    /// Hours billed.
    pub hours_alive: f64,
    /// Provider id.
    pub provider: String,
    /// Account name.
    pub account: String,
    /// Invoice or bill reference the hours come from.
    pub bill: String,
}

impl VmLifetimeRecord {
    /// Returns true if the machine has been alive longer than `threshold_hours`.
    pub fn exceeds(&self, threshold_hours: f64) -> bool {
        self.hours_alive > threshold_hours
    }
}

// ============================================================================
// Lifetime Policy
// ============================================================================

/// When the lifetime check runs as part of a cost run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifetimePolicy {
    /// Only when a returned cost item's period starts today.
    #[default]
    BillingCycleStart,
    /// On every cost run.
    Always,
    /// Never during cost runs.
    Never,
}

impl LifetimePolicy {
    /// Decides whether to run the lifetime check for an account's items.
    pub fn should_check(&self, items: &[CostItem], today: NaiveDate) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::BillingCycleStart => items.iter().any(|item| item.starts_on(today)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
