//! JSON output formatting.

use anyhow::Result;
use cloudcost_core::{Account, FailureRecord, SkippedAccount, VmLifetimeRecord};
use cloudcost_engine::{export_rows, CostRunSummary, DeliveryReport, DeliveryTarget, ExportRow, LifetimeRunSummary};
use cloudcost_fetch::AdapterInfo;
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a cost run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRunOutput<'a> {
    pub rows: Vec<ExportRow>,
    pub total: String,
    pub failures: &'a [FailureRecord],
    pub anomalies: &'a [VmLifetimeRecord],
    pub skipped: &'a [SkippedAccount],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryOutput>,
}

/// JSON output for a lifetime run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeRunOutput<'a> {
    pub checked: usize,
    pub errors: usize,
    pub anomalies: &'a [VmLifetimeRecord],
    pub skipped: &'a [SkippedAccount],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryOutput>,
}

/// Delivery result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutput {
    pub delivered: Vec<DeliveryTarget>,
    pub errors: Vec<String>,
}

impl From<&DeliveryReport> for DeliveryOutput {
    fn from(report: &DeliveryReport) -> Self {
        Self {
            delivered: report.delivered.clone(),
            errors: report.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

/// An account without credential values.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOutput<'a> {
    pub provider: &'a str,
    pub name: &'a str,
    pub enabled: bool,
    pub sort_order: i64,
    pub fields: Vec<&'a str>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats a cost run.
    pub fn format_cost_run(&self, summary: &CostRunSummary) -> Result<String> {
        let outcome = &summary.outcome;
        self.render(&CostRunOutput {
            rows: export_rows(&outcome.report),
            total: format!("{:.2}", outcome.report.total().round_dp(2)),
            failures: outcome.failures.records(),
            anomalies: &outcome.anomalies,
            skipped: &outcome.skipped,
            export_path: summary.export_path().map(|p| p.display().to_string()),
            export_error: summary.export.as_ref().err().map(ToString::to_string),
            delivery: summary.delivery.as_ref().map(DeliveryOutput::from),
        })
    }

    /// Formats a lifetime run.
    pub fn format_lifetime_run(&self, summary: &LifetimeRunSummary) -> Result<String> {
        let outcome = &summary.outcome;
        self.render(&LifetimeRunOutput {
            checked: outcome.checked,
            errors: outcome.errors,
            anomalies: &outcome.anomalies,
            skipped: &outcome.skipped,
            delivery: summary.delivery.as_ref().map(DeliveryOutput::from),
        })
    }

    /// Formats the provider list.
    pub fn format_providers(&self, infos: &[AdapterInfo]) -> Result<String> {
        self.render(&infos)
    }

    /// Formats the account list.
    pub fn format_accounts(&self, accounts: &[Account]) -> Result<String> {
        let output: Vec<AccountOutput<'_>> = accounts
            .iter()
            .map(|a| AccountOutput {
                provider: &a.provider,
                name: &a.name,
                enabled: a.enabled,
                sort_order: a.sort_order,
                fields: a.credentials.fields().collect(),
            })
            .collect();
        self.render(&output)
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        })
    }
}
