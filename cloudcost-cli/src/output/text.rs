//! Text output formatting with colors.

use std::fmt::Write;

use cloudcost_core::{Account, FailureSet, SkippedAccount, VmLifetimeRecord, REPORT_CURRENCY};
use cloudcost_engine::{export_rows, CostRunSummary, DeliveryReport, LifetimeRunSummary};
use cloudcost_fetch::AdapterInfo;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

const RULE_WIDTH: usize = 96;

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Runs
    // ========================================================================

    /// Formats a cost run: rows, total, failures, anomalies, export and delivery.
    pub fn format_cost_run(&self, summary: &CostRunSummary) -> String {
        let mut out = String::new();
        let outcome = &summary.outcome;

        let _ = writeln!(
            out,
            "{}",
            self.bold(&format!(
                "{:<16} {:<13} {:<13} {:<24} {:>15}  {}",
                "Provider", "Billing Start", "Billing End", "Account Name", "Current Invoice", "Balance"
            ))
        );
        let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
        for row in export_rows(&outcome.report) {
            let _ = writeln!(
                out,
                "{:<16} {:<13} {:<13} {:<24} {:>15}  {}",
                row.provider, row.billing_start, row.billing_end, row.account_name, row.current_invoice, row.balance
            );
        }
        let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
        let _ = writeln!(
            out,
            "Total: {} {} ({} rows from {} accounts)",
            self.bold(&format!("{:.2}", outcome.report.total().round_dp(2))),
            REPORT_CURRENCY,
            outcome.report.len(),
            outcome.succeeded
        );

        out.push_str(&self.format_failures(&outcome.failures));
        out.push_str(&self.format_anomalies(&outcome.anomalies));
        out.push_str(&self.format_skipped(&outcome.skipped));

        match &summary.export {
            Ok(path) => {
                let _ = writeln!(out, "\nExport: {}", path.display());
            }
            Err(e) => {
                let _ = writeln!(out, "\n{} {e}", self.color(RED, "Export failed:"));
            }
        }
        out.push_str(&self.format_delivery(summary.delivery.as_ref()));
        out
    }

    /// Formats a lifetime run.
    pub fn format_lifetime_run(&self, summary: &LifetimeRunSummary) -> String {
        let mut out = String::new();
        let outcome = &summary.outcome;

        let _ = writeln!(
            out,
            "Checked {} accounts ({} failed)",
            outcome.checked, outcome.errors
        );
        if outcome.anomalies.is_empty() {
            let _ = writeln!(out, "{}", self.color(GREEN, "No machines billed for more than 7 days"));
        }
        out.push_str(&self.format_anomalies(&outcome.anomalies));
        out.push_str(&self.format_skipped(&outcome.skipped));
        out.push_str(&self.format_delivery(summary.delivery.as_ref()));
        out
    }

    fn format_failures(&self, failures: &FailureSet) -> String {
        if failures.is_empty() {
            return String::new();
        }
        let mut out = format!("\n{}\n", self.bold(&format!("Failures ({})", failures.len())));
        for f in failures.records() {
            let _ = writeln!(out, "  {} {}/{}: {}", self.color(RED, "✗"), f.provider, f.account, f.error);
        }
        out
    }

    fn format_anomalies(&self, anomalies: &[VmLifetimeRecord]) -> String {
        if anomalies.is_empty() {
            return String::new();
        }
        let mut out = format!(
            "\n{}\n",
            self.bold(&format!("Machines billed for > 7 days ({})", anomalies.len()))
        );
        for r in anomalies {
            let _ = writeln!(
                out,
                "  {} {} ({}/{}) {:.2} h, bill {}",
                self.color(YELLOW, "⚠"),
                r.vm_name,
                r.provider,
                r.account,
                r.hours_alive,
                r.bill
            );
        }
        out
    }

    fn format_skipped(&self, skipped: &[SkippedAccount]) -> String {
        if skipped.is_empty() {
            return String::new();
        }
        let names: Vec<String> = skipped
            .iter()
            .map(|s| format!("{}/{}", s.provider, s.account))
            .collect();
        format!("\n{}\n", self.dim(&format!("Disabled: {}", names.join(", "))))
    }

    fn format_delivery(&self, delivery: Option<&DeliveryReport>) -> String {
        let Some(report) = delivery else {
            return format!("Delivery: {}\n", self.dim("skipped"));
        };
        let mut out = String::new();
        if report.delivered.is_empty() && report.errors.is_empty() {
            out.push_str("Delivery: nothing to send\n");
        }
        for target in &report.delivered {
            let _ = writeln!(out, "Delivery: {} {target}", self.color(GREEN, "✓"));
        }
        for e in &report.errors {
            let _ = writeln!(out, "Delivery: {} {e}", self.color(RED, "✗"));
        }
        out
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// Formats the provider list.
    pub fn format_providers(&self, infos: &[AdapterInfo]) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}",
            self.bold(&format!("{:<18} {:<9} {}", "Provider", "Lifetime", "Credentials"))
        );
        let _ = writeln!(out, "{}", "─".repeat(70));
        for info in infos {
            let fields: Vec<String> = info
                .credentials
                .iter()
                .map(|f| if f.sensitive { format!("{}*", f.name) } else { f.name.to_string() })
                .collect();
            let lifetime = if info.lifetime { "yes" } else { "-" };
            let _ = writeln!(out, "{:<18} {:<9} {}", info.id, lifetime, fields.join(", "));
        }
        let _ = writeln!(out, "\nTotal: {} providers (* = secret)", infos.len());
        out
    }

    /// Formats the account list. Credential values are never shown.
    pub fn format_accounts(&self, accounts: &[Account]) -> String {
        if accounts.is_empty() {
            return "No accounts configured\n".to_string();
        }
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}",
            self.bold(&format!("{:>5}  {:<18} {:<24} {:<8} {}", "Order", "Provider", "Account", "Status", "Fields"))
        );
        let _ = writeln!(out, "{}", "─".repeat(80));
        for a in accounts {
            let status = if a.enabled {
                self.color(GREEN, "enabled ")
            } else {
                self.color(RED, "disabled")
            };
            let fields: Vec<&str> = a.credentials.fields().collect();
            let _ = writeln!(
                out,
                "{:>5}  {:<18} {:<24} {} {}",
                a.sort_order,
                a.provider,
                a.name,
                status,
                fields.join(", ")
            );
        }
        out
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn color(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.color(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.color(DIM, text)
    }
}
