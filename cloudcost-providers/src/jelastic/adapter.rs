//! Jelastic adapter.

use async_trait::async_trait;
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::{month_start, next_month_start};
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::api::{Account, BillingHistory};

/// Generic application id accepted by every Jelastic installation.
const APP_ID: &str = "1dd8d191d38fff45e62564fcf67fdcd6";

const SCHEMA: &[CredentialField] = &[CredentialField::secret("api_key", "Session token")];

/// One Jelastic reseller.
#[derive(Debug, Clone, Copy)]
pub struct JelasticHost {
    /// Provider id.
    pub id: &'static str,
    /// Display name.
    pub display_name: &'static str,
    /// Platform base URL.
    pub endpoint: &'static str,
    /// Billing currency.
    pub currency: &'static str,
}

/// Built-in Jelastic resellers.
pub const HOSTS: &[JelasticHost] = &[
    JelasticHost { id: "cloudjiffy", display_name: "CloudJiffy", endpoint: "https://app.cloudjiffy.com", currency: "USD" },
    JelasticHost { id: "eapps", display_name: "eApps", endpoint: "https://app.jelastic.eapps.com", currency: "USD" },
    JelasticHost { id: "layershift", display_name: "Layershift", endpoint: "https://app.j.layershift.co.uk", currency: "GBP" },
    JelasticHost { id: "mamazala", display_name: "Mamazala", endpoint: "https://app.paas.mamazala.com", currency: "USD" },
    JelasticHost { id: "mirhosting", display_name: "MIRhosting", endpoint: "https://app.mircloud.host", currency: "EUR" },
    JelasticHost { id: "togglebox", display_name: "Togglebox", endpoint: "https://app.togglebox.cloud", currency: "USD" },
    JelasticHost { id: "cloudsigma-paas", display_name: "CloudSigma PaaS", endpoint: "https://app.env2.paas.ruh.cloudsigma.com", currency: "USD" },
];

/// Jelastic billing adapter.
#[derive(Debug, Clone)]
pub struct JelasticAdapter {
    host: JelasticHost,
    endpoint: String,
}

impl JelasticAdapter {
    /// Creates an adapter for a reseller.
    pub fn new(host: JelasticHost) -> Self {
        Self {
            host,
            endpoint: host.endpoint.to_string(),
        }
    }

    /// Points the adapter at another base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// All built-in resellers.
    pub fn builtin() -> impl Iterator<Item = Self> {
        HOSTS.iter().copied().map(Self::new)
    }

    fn url(&self, call: &str) -> String {
        format!("{}/1.0/billing/account/rest/{call}", self.endpoint)
    }
}

#[async_trait]
impl ProviderAdapter for JelasticAdapter {
    fn id(&self) -> &str {
        self.host.id
    }

    fn display_name(&self) -> &str {
        self.host.display_name
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
        let session = credentials.require("api_key")?;
        let today = ctx.today();
        let (first_day, last_day) = (month_start(today), next_month_start(today));

        let history: BillingHistory = ctx
            .http
            .fetch_json(ctx.http.get(&self.url("getaccountbillinghistorybyperiod")).query(&[
                ("appid", APP_ID.to_string()),
                ("session", session.to_string()),
                ("starttime", first_day.format("%Y-%m-%d 00:00:00").to_string()),
                ("endtime", last_day.format("%Y-%m-%d 00:00:00").to_string()),
                ("period", "MONTH".to_string()),
            ]))
            .await?;
        history.status.check("getaccountbillinghistorybyperiod")?;
        let total: Decimal = history.array.iter().map(|e| e.cost).sum();

        let account: Account = ctx
            .http
            .fetch_json(
                ctx.http
                    .get(&self.url("getaccount"))
                    .query(&[("appid", APP_ID), ("session", session)]),
            )
            .await?;
        account.status.check("getaccount")?;
        let balance = format!("{:.2} {}", account.balance.round_dp(2), self.host.currency);

        let amount = ctx.currency.to_report_currency(total, self.host.currency)?;
        debug!(entries = history.array.len(), currency = self.host.currency, "Summed billing history");

        Ok(vec![
            CostItem::new(amount, Some(first_day), Some(last_day)).with_balance(balance),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cloudcost_fetch::StaticRateConverter;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn host(id: &str) -> JelasticHost {
        *HOSTS.iter().find(|h| h.id == id).unwrap()
    }

    fn ctx() -> FetchContext {
        FetchContext::builder()
            .today(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())
            .currency(Arc::new(StaticRateConverter::new().with_rate("GBP", Decimal::new(125, 2))))
            .build()
    }

    async fn mount(server: &MockServer, history: &str, account: &str) {
        Mock::given(method("GET"))
            .and(path("/1.0/billing/account/rest/getaccountbillinghistorybyperiod"))
            .and(query_param("session", "sess"))
            .and(query_param("starttime", "2024-03-01 00:00:00"))
            .and(query_param("endtime", "2024-04-01 00:00:00"))
            .respond_with(ResponseTemplate::new(200).set_body_string(history.to_string()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1.0/billing/account/rest/getaccount"))
            .respond_with(ResponseTemplate::new(200).set_body_string(account.to_string()))
            .mount(server)
            .await;
    }

    fn creds() -> Credentials {
        [("api_key", "sess")].into_iter().collect()
    }

    #[test]
    fn test_builtin_hosts_are_unique() {
        let ids: Vec<_> = JelasticAdapter::builtin().map(|a| a.id().to_string()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids.len(), sorted.len());
        assert_eq!(ids.len(), 7);
    }

    #[tokio::test]
    async fn test_usd_host_sums_costs() {
        let server = MockServer::start().await;
        mount(
            &server,
            r#"{"result":0,"array":[{"cost":1.5},{"cost":2.25}]}"#,
            r#"{"result":0,"balance":20.456}"#,
        )
        .await;

        let adapter = JelasticAdapter::new(host("cloudjiffy")).with_endpoint(server.uri());
        let items = adapter.cost(&ctx(), "me", &creds()).await.unwrap();

        assert_eq!(items[0].amount, Decimal::new(375, 2));
        assert_eq!(items[0].balance.as_deref(), Some("20.46 USD"));
        assert_eq!(items[0].period_start, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[tokio::test]
    async fn test_gbp_host_converts_total_not_balance() {
        let server = MockServer::start().await;
        mount(&server, r#"{"result":0,"array":[{"cost":10}]}"#, r#"{"result":0,"balance":5}"#).await;

        let adapter = JelasticAdapter::new(host("layershift")).with_endpoint(server.uri());
        let items = adapter.cost(&ctx(), "me", &creds()).await.unwrap();

        assert_eq!(items[0].amount, Decimal::new(1250, 2));
        assert_eq!(items[0].balance.as_deref(), Some("5.00 GBP"));
    }

    #[tokio::test]
    async fn test_missing_rate_fails_the_account() {
        let server = MockServer::start().await;
        mount(&server, r#"{"result":0,"array":[{"cost":10}]}"#, r#"{"result":0,"balance":5}"#).await;

        let adapter = JelasticAdapter::new(host("mirhosting")).with_endpoint(server.uri());
        let result = adapter.cost(&ctx(), "me", &creds()).await;
        assert!(matches!(result, Err(ProviderError::Core(_))));
    }

    #[tokio::test]
    async fn test_nonzero_result_is_error() {
        let server = MockServer::start().await;
        mount(&server, r#"{"result":702,"error":"session expired"}"#, "{}").await;

        let adapter = JelasticAdapter::new(host("eapps")).with_endpoint(server.uri());
        let err = adapter.cost(&ctx(), "me", &creds()).await.unwrap_err();
        assert!(err.to_string().contains("session expired"));
    }
}
