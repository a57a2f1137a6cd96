//! Jelastic billing API types.

use rust_decimal::Decimal;
use serde::Deserialize;

use cloudcost_fetch::ProviderError;

/// Fields every Jelastic response carries. A non-zero `result` is an error
/// even on HTTP 200.
#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    #[serde(default)]
    pub result: i64,
    #[serde(default)]
    pub error: Option<String>,
}

impl Status {
    pub fn check(&self, call: &str) -> Result<(), ProviderError> {
        if self.result == 0 {
            return Ok(());
        }
        let message = self.error.as_deref().unwrap_or("unknown error");
        Err(ProviderError::InvalidResponse(format!(
            "{call} returned {}: {message}",
            self.result
        )))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BillingHistory {
    #[serde(flatten)]
    pub status: Status,
    #[serde(default)]
    pub array: Vec<BillingEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BillingEntry {
    #[serde(default)]
    pub cost: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Account {
    #[serde(flatten)]
    pub status: Status,
    #[serde(default)]
    pub balance: Decimal,
}
