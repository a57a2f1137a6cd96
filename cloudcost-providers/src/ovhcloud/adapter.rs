//! OVHcloud adapter.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::{month_start, next_month_start, parse_billing_date};
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::signer::{resolve_endpoint, RequestSigner};

const SCHEMA: &[CredentialField] = &[
    CredentialField::public("endpoint", "API endpoint (e.g. ovh-eu)"),
    CredentialField::public("app_key", "Application key"),
    CredentialField::secret("app_secret", "Application secret"),
    CredentialField::secret("consumer_key", "Consumer key"),
];

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Forecast {
    price: Price,
}

#[derive(Debug, Deserialize)]
struct Price {
    value: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Bill {
    date: String,
    price_with_tax: Price,
}

// ============================================================================
// Signed Client
// ============================================================================

struct OvhClient<'a> {
    ctx: &'a FetchContext,
    base: String,
    app_key: &'a str,
    consumer_key: &'a str,
    signer: RequestSigner<'a>,
    time_delta: i64,
}

impl<'a> OvhClient<'a> {
    async fn connect(ctx: &'a FetchContext, credentials: &'a Credentials) -> Result<Self, ProviderError> {
        let endpoint = credentials.require("endpoint")?;
        let base = resolve_endpoint(endpoint)
            .ok_or_else(|| ProviderError::InvalidResponse(format!("unknown OVH endpoint `{endpoint}`")))?;
        let app_secret = credentials.require("app_secret")?;
        let consumer_key = credentials.require("consumer_key")?;

        let server_time: i64 = ctx
            .http
            .fetch_json(ctx.http.get(&format!("{base}/auth/time")))
            .await?;

        Ok(Self {
            ctx,
            base,
            app_key: credentials.require("app_key")?,
            consumer_key,
            signer: RequestSigner::new(app_secret, consumer_key),
            time_delta: server_time - Utc::now().timestamp(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ProviderError> {
        let mut url = Url::parse(&format!("{}{path}", self.base))
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        for (key, value) in query {
            url.query_pairs_mut().append_pair(key, value);
        }

        let timestamp = Utc::now().timestamp() + self.time_delta;
        let signature = self.signer.sign("GET", url.as_str(), "", timestamp);
        let request = self
            .ctx
            .http
            .get(url.as_str())
            .header("X-Ovh-Application", self.app_key)
            .header("X-Ovh-Consumer", self.consumer_key)
            .header("X-Ovh-Timestamp", timestamp.to_string())
            .header("X-Ovh-Signature", signature);

        Ok(self.ctx.http.fetch_json(request).await?)
    }
}

fn iso_midnight(day: NaiveDate) -> String {
    day.format("%Y-%m-%dT00:00:00").to_string()
}

fn parse_bill_date(raw: &str) -> Result<DateTime<FixedOffset>, ProviderError> {
    DateTime::parse_from_rfc3339(raw).map_err(|_| ProviderError::InvalidResponse(format!("invalid bill date `{raw}`")))
}

// ============================================================================
// Adapter
// ============================================================================

/// OVHcloud consumption adapter.
#[derive(Debug, Clone, Default)]
pub struct OvhAdapter;

impl OvhAdapter {
    /// Creates the adapter. The API base comes from each account's `endpoint`.
    pub fn new() -> Self {
        Self
    }

    async fn latest_bill(client: &OvhClient<'_>) -> Result<Option<Bill>, ProviderError> {
        let ids: Vec<String> = client.get("/me/bill", &[]).await?;
        let mut latest: Option<(DateTime<FixedOffset>, Bill)> = None;
        for id in &ids {
            let bill: Bill = client.get(&format!("/me/bill/{id}"), &[]).await?;
            let date = parse_bill_date(&bill.date)?;
            if latest.as_ref().is_none_or(|(current, _)| date > *current) {
                latest = Some((date, bill));
            }
        }
        debug!(bills = ids.len(), "Scanned bills");
        Ok(latest.map(|(_, bill)| bill))
    }
}

#[async_trait]
impl ProviderAdapter for OvhAdapter {
    fn id(&self) -> &str {
        "ovhcloud"
    }

    fn display_name(&self) -> &str {
        "OVHcloud"
    }

    fn credential_schema(&self) -> &'static [CredentialField] {
        SCHEMA
    }

    #[instrument(skip(self, ctx, credentials))]
    async fn cost(
        &self,
        ctx: &FetchContext,
        account_name: &str,
        credentials: &Credentials,
    ) -> Result<Vec<CostItem>, ProviderError> {
        let client = OvhClient::connect(ctx, credentials).await?;

        client
            .get::<serde_json::Value>("/me", &[])
            .await
            .map_err(|e| ProviderError::AuthenticationFailed(format!("credential check failed: {e}")))?;

        let today = ctx.today();
        let (first_day, last_day) = (month_start(today), next_month_start(today));
        let (begin, end) = (iso_midnight(first_day), iso_midnight(last_day));
        let forecast: Vec<Forecast> = client
            .get(
                "/me/consumption/usage/forecast",
                &[("beginDate", begin.as_str()), ("endDate", end.as_str())],
            )
            .await?;

        let Some(next) = forecast.first() else {
            debug!("Empty forecast");
            return Ok(vec![CostItem::new(Decimal::ZERO, None, Some(today))]);
        };

        let mut items = vec![CostItem::new(next.price.value, Some(first_day), Some(last_day))];
        if let Some(bill) = Self::latest_bill(&client).await? {
            items.push(CostItem::new(
                bill.price_with_tax.value,
                None,
                parse_billing_date(&bill.date)?,
            ));
        }
        Ok(items)
    }
}
