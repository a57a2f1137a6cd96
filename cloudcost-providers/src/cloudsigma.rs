//! CloudSigma provider implementation.
//!
//! Sums the positive ledger entries of the running month. Negative entries
//! are top-ups. The balance is reported alongside the cost.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::month_start;
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use reqwest::RequestBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

const DEFAULT_ENDPOINT: &str = "https://ruh.cloudsigma.com/api/2.0";

const SCHEMA: &[CredentialField] = &[CredentialField::secret("password", "Password")];

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct LedgerResponse {
    meta: LedgerMeta,
    #[serde(default)]
    objects: Vec<LedgerEntry>,
}

#[derive(Debug, Deserialize)]
struct LedgerMeta {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct LedgerEntry {
    amount: Decimal,
}

/// CloudSigma ledger adapter.
#[derive(Debug, Clone)]
pub struct CloudSigmaAdapter {
    endpoint: String,
}

impl CloudSigmaAdapter {
    /// Creates an adapter for the Riyadh region.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates an adapter against another region or base URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, ctx: &FetchContext, path: &str, user: &str, password: &str) -> RequestBuilder {
        ctx.http
            .get(&format!("{}{path}", self.endpoint))
            .basic_auth(user, Some(password))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn ledger(
        &self,
        ctx: &FetchContext,
        (user, password): (&str, &str),
        (from, to): (NaiveDate, NaiveDate),
        limit: u64,
    ) -> Result<LedgerResponse, ProviderError> {
        let query = [
            ("time__gt", from.format("%Y-%m-%d").to_string()),
            ("time__lt", to.format("%Y-%m-%d").to_string()),
            ("limit", limit.to_string()),
        ];
        Ok(ctx
            .http
            .fetch_json(self.get(ctx, "/ledger", user, password).query(&query))
            .await?)
    }
}

impl Default for CloudSigmaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for CloudSigmaAdapter {
    fn id(&self) -> &str {
        "cloudsigma"
    }

    fn display_name(&self) -> &str {
        "CloudSigma"
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
        let auth = (account_name, credentials.require("password")?);

        let balance: BalanceResponse = ctx
            .http
            .fetch_json(self.get(ctx, "/balance", auth.0, auth.1))
            .await?;

        let today = ctx.today();
        let first_day = month_start(today);
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let period = (first_day, tomorrow);

        let count = self.ledger(ctx, auth, period, 0).await?.meta.total_count;
        let ledger = self.ledger(ctx, auth, period, count).await?;
        debug!(entries = ledger.objects.len(), "Fetched ledger");

        let total: Decimal = ledger
            .objects
            .iter()
            .map(|e| e.amount)
            .filter(|amount| *amount > Decimal::ZERO)
            .sum();

        Ok(vec![
            CostItem::new(total, Some(first_day), Some(tomorrow))
                .with_balance(format!("{} USD", balance.balance)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sums_positive_ledger_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/balance"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"balance":"150.25","currency":"USD"}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ledger"))
            .and(query_param("limit", "0"))
            .and(query_param("time__gt", "2024-03-01"))
            .and(query_param("time__lt", "2024-03-15"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"meta":{"total_count":3},"objects":[]}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ledger"))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"meta":{"total_count":3},"objects":[{"amount":"10.50"},{"amount":"-100.00"},{"amount":"4.25"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = FetchContext::builder()
            .today(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())
            .build();
        let creds: Credentials = [("password", "pw")].into_iter().collect();
        let items = CloudSigmaAdapter::with_endpoint(server.uri())
            .cost(&ctx, "ops@example.com", &creds)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, Decimal::new(1475, 2));
        assert_eq!(items[0].balance.as_deref(), Some("150.25 USD"));
        assert_eq!(items[0].period_end, NaiveDate::from_ymd_opt(2024, 3, 15));
    }
}
