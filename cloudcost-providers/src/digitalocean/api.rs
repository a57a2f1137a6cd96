//! DigitalOcean billing API types.

use rust_decimal::Decimal;
use serde::Deserialize;

/// `GET /v2/customers/my/balance`.
#[derive(Debug, Deserialize)]
pub struct Balance {
    /// Usage so far in the running month.
    pub month_to_date_usage: Decimal,
    /// Account balance.
    #[serde(default)]
    pub account_balance: Option<Decimal>,
}

/// Entry of `GET /v2/customers/my/invoices`.
#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    /// Invoice id.
    pub invoice_uuid: String,
    /// Billing month as `YYYY-MM`.
    pub invoice_period: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvoiceList {
    #[serde(default)]
    pub invoices: Vec<Invoice>,
}

/// Line of `GET /v2/customers/my/invoices/{uuid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceItem {
    /// Product family, e.g. `Droplets`.
    #[serde(default)]
    pub product: String,
    /// Resource id.
    #[serde(default)]
    pub resource_uuid: Option<String>,
    /// Human-readable resource description.
    #[serde(default)]
    pub description: String,
    /// Billed duration.
    #[serde(default)]
    pub duration: Option<String>,
    /// Unit of `duration`.
    #[serde(default)]
    pub duration_unit: Option<String>,
}

impl InvoiceItem {
    /// Hours billed, if this item is billed by the hour.
    pub fn hours(&self) -> Option<f64> {
        let unit = self.duration_unit.as_deref()?;
        if !unit.eq_ignore_ascii_case("hours") {
            return None;
        }
        self.duration.as_deref()?.trim().parse().ok()
    }

    /// Key identifying the machine across items.
    pub fn machine_key(&self) -> &str {
        self.resource_uuid
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.description)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvoiceItems {
    #[serde(default)]
    pub invoice_items: Vec<InvoiceItem>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub pages: Pages,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Pages {
    #[serde(default)]
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_only_for_hourly_items() {
        let item: InvoiceItem = serde_json::from_str(
            r#"{"product":"Droplets","resource_uuid":"abc","description":"web-1","duration":"200","duration_unit":"Hours"}"#,
        )
        .unwrap();
        assert_eq!(item.hours(), Some(200.0));
        assert_eq!(item.machine_key(), "abc");

        let flat: InvoiceItem =
            serde_json::from_str(r#"{"product":"Spaces","description":"cdn","duration":"1","duration_unit":"Month"}"#)
                .unwrap();
        assert_eq!(flat.hours(), None);
        assert_eq!(flat.machine_key(), "cdn");
    }

    #[test]
    fn test_balance_accepts_string_amounts() {
        let balance: Balance =
            serde_json::from_str(r#"{"month_to_date_usage":"23.44","account_balance":"-5.00"}"#).unwrap();
        assert_eq!(balance.month_to_date_usage, Decimal::new(2344, 2));
    }
}
