//! Azure token and consumption API types.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsagePage {
    #[serde(default)]
    pub value: Vec<UsageDetail>,
    #[serde(default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsageDetail {
    pub properties: UsageProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageProperties {
    #[serde(default, rename = "paygCostInUSD")]
    pub payg_cost_in_usd: Decimal,
    #[serde(default)]
    pub service_period_start_date: Option<String>,
    #[serde(default)]
    pub service_period_end_date: Option<String>,
}
