//! SoftLayer REST API types.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level item of the next invoice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NextInvoiceItem {
    pub id: u64,
    #[serde(default)]
    pub category_code: String,
    #[serde(default)]
    pub recurring_fee: Decimal,
    #[serde(default)]
    pub cycle_start_date: Option<String>,
    #[serde(default)]
    pub next_bill_date: Option<String>,
}

/// Top-level item of an issued invoice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InvoiceItem {
    pub id: u64,
    #[serde(default)]
    pub category_code: String,
    #[serde(default)]
    pub recurring_fee: Decimal,
}

/// Child item carrying a usage fee.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChildItem {
    #[serde(default)]
    pub recurring_fee: Decimal,
}

/// `getLatestRecurringInvoice`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Invoice {
    pub id: u64,
    pub create_date: String,
}
