//! Run result types.
//!
//! - [`ProviderResult`] - Terminal outcome of one account's cost call
//! - [`Report`] - Ordered cost rows for a run
//! - [`FailureSet`] - Accounts that failed to report
//! - [`SkippedAccount`] - Disabled accounts passed over

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::cost::CostItem;

// ============================================================================
// Provider Result
// ============================================================================

/// Outcome of dispatching one account to its adapter.
#[derive(Debug, Clone)]
pub enum ProviderResult {
    /// The adapter returned cost items (possibly none).
    Success {
        /// The account that was dispatched.
        account: Account,
        /// Items returned by the adapter.
        items: Vec<CostItem>,
    },
    /// Resolution or the cost call failed.
    Failure {
        /// The account that was dispatched.
        account: Account,
        /// Rendered error.
        error: String,
    },
}

impl ProviderResult {
    /// The account this result belongs to.
    pub fn account(&self) -> &Account {
        match self {
            Self::Success { account, .. } | Self::Failure { account, .. } => account,
        }
    }

    /// Returns true for the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// ============================================================================
// Report
// ============================================================================

/// One report line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Provider id.
    pub provider: String,
    /// Billing period start.
    pub period_start: Option<NaiveDate>,
    /// Billing period end.
    pub period_end: Option<NaiveDate>,
    /// Account name.
    pub account_name: String,
    /// Amount in the report currency.
    pub amount: Decimal,
    /// Provider-formatted balance.
    pub balance: Option<String>,
}

impl ReportRow {
    /// Builds a row from a cost item.
    pub fn from_item(provider: &str, account_name: &str, item: &CostItem) -> Self {
        Self {
            provider: provider.to_string(),
            period_start: item.period_start,
            period_end: item.period_end,
            account_name: account_name.to_string(),
            amount: item.amount,
            balance: item.balance.clone(),
        }
    }
}

/// Append-only sequence of rows in account processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one row per item, tagged with provider and account.
    pub fn append(&mut self, provider: &str, account_name: &str, items: &[CostItem]) {
        self.rows
            .extend(items.iter().map(|item| ReportRow::from_item(provider, account_name, item)));
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all amounts.
    pub fn total(&self) -> Decimal {
        self.rows.iter().map(|r| r.amount).sum()
    }

    /// Rows for one account.
    pub fn rows_for<'a>(&'a self, provider: &'a str, account_name: &'a str) -> impl Iterator<Item = &'a ReportRow> {
        self.rows
            .iter()
            .filter(move |r| r.provider == provider && r.account_name == account_name)
    }
}

// ============================================================================
// Failure Set
// ============================================================================

/// An account that failed to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Provider id.
    pub provider: String,
    /// Account name.
    pub account: String,
    /// Rendered error.
    pub error: String,
}

/// Failures accumulated during a run, one per failed dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSet {
    records: Vec<FailureRecord>,
}

impl FailureSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure. Every call adds one record, so a pair listed twice
    /// by the store yields two records.
    pub fn record(&mut self, provider: &str, account: &str, error: impl Into<String>) {
        self.records.push(FailureRecord {
            provider: provider.to_string(),
            account: account.to_string(),
            error: error.into(),
        });
    }

    /// Returns true if the account has a failure recorded.
    pub fn contains(&self, provider: &str, account: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.provider == provider && r.account == account)
    }

    /// Failures in the order they were recorded.
    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    /// Number of failed accounts.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Skipped Accounts
// ============================================================================

/// A disabled account that was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAccount {
    /// Provider id.
    pub provider: String,
    /// Account name.
    pub account: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_keeps_insertion_order() {
        let mut report = Report::new();
        report.append("zeta", "b", &[CostItem::new(Decimal::new(200, 2), None, None)]);
        report.append("alpha", "a", &[CostItem::new(Decimal::new(100, 2), None, None)]);

        let providers: Vec<_> = report.rows().iter().map(|r| r.provider.as_str()).collect();
        assert_eq!(providers, vec!["zeta", "alpha"]);
        assert_eq!(report.total(), Decimal::new(300, 2));
    }

    #[test]
    fn test_empty_items_add_no_rows() {
        let mut report = Report::new();
        report.append("foo", "A", &[]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_failure_set_keeps_every_record() {
        let mut failures = FailureSet::new();
        failures.record("bar", "B", "connection refused");
        failures.record("bar", "B", "timed out");
        failures.record("bar", "C", "auth");

        assert_eq!(failures.len(), 3);
        assert_eq!(failures.records()[0].error, "connection refused");
        assert_eq!(failures.records()[1].error, "timed out");
        assert!(failures.contains("bar", "C"));
        assert!(!failures.contains("foo", "B"));
    }
}
