//! CSV export of a finalized report.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use cloudcost_core::{Report, ReportRow};
use serde::Serialize;
use tracing::info;

use crate::error::ExportError;

/// Export column names, in order.
pub const EXPORT_HEADER: [&str; 6] = [
    "Provider",
    "Billing Start",
    "Billing End",
    "Account Name",
    "Current Invoice",
    "Balance",
];

/// One rendered export line. Absent values are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    /// Provider id.
    pub provider: String,
    /// `YYYY-MM-DD` or empty.
    pub billing_start: String,
    /// `YYYY-MM-DD` or empty.
    pub billing_end: String,
    /// Account name.
    pub account_name: String,
    /// Amount with two decimals.
    pub current_invoice: String,
    /// Balance or empty.
    pub balance: String,
}

impl From<&ReportRow> for ExportRow {
    fn from(row: &ReportRow) -> Self {
        Self {
            provider: row.provider.clone(),
            billing_start: render_date(row.period_start),
            billing_end: render_date(row.period_end),
            account_name: row.account_name.clone(),
            current_invoice: format!("{:.2}", row.amount.round_dp(2)),
            balance: row.balance.clone().unwrap_or_default(),
        }
    }
}

fn render_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Renders every report row, in report order.
pub fn export_rows(report: &Report) -> Vec<ExportRow> {
    report.rows().iter().map(ExportRow::from).collect()
}

/// File name for the export of `day`.
pub fn export_file_name(day: NaiveDate) -> String {
    format!("cloudcost{}.csv", day.format("%Y-%m-%d"))
}

/// Writes the header and all rows as CSV.
///
/// # Errors
///
/// Fails if the writer fails.
pub fn write_csv<W: Write>(report: &Report, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(EXPORT_HEADER)?;
    for row in export_rows(report) {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the export file for `day` into `dir` and returns its path.
///
/// # Errors
///
/// Fails if the directory or file cannot be written.
pub fn write_export(report: &Report, dir: &Path, day: NaiveDate) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(day));
    let file = std::fs::File::create(&path)?;
    write_csv(report, file)?;
    info!(path = %path.display(), rows = report.len(), "Export written");
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
