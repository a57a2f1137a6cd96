//! Azure adapter.

use async_trait::async_trait;
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::parse_billing_date;
use cloudcost_fetch::host::http::{bearer, AUTHORIZATION};
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::api::{TokenResponse, UsagePage};

const LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";
const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const API_VERSION: &str = "2021-10-01";

const SCHEMA: &[CredentialField] = &[
    CredentialField::secret("password", "Client secret"),
    CredentialField::public("subscription", "Subscription ID"),
    CredentialField::public("client_id", "Client ID"),
    CredentialField::public("tenant_id", "Tenant ID"),
];

/// Azure consumption adapter.
#[derive(Debug, Clone)]
pub struct AzureAdapter {
    login: String,
    management: String,
}

impl AzureAdapter {
    /// Creates an adapter for the public cloud.
    pub fn new() -> Self {
        Self::with_endpoints(LOGIN_ENDPOINT, MANAGEMENT_ENDPOINT)
    }

    /// Creates an adapter using the same base URL for login and management.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self::with_endpoints(endpoint.clone(), endpoint)
    }

    /// Creates an adapter against other login and management hosts.
    pub fn with_endpoints(login: impl Into<String>, management: impl Into<String>) -> Self {
        Self {
            login: login.into().trim_end_matches('/').to_string(),
            management: management.into().trim_end_matches('/').to_string(),
        }
    }

    async fn token(&self, ctx: &FetchContext, credentials: &Credentials) -> Result<String, ProviderError> {
        let tenant = credentials.require("tenant_id")?;
        let url = format!("{}/{tenant}/oauth2/token", self.login);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.require("client_id")?),
            ("client_secret", credentials.require("password")?),
            ("resource", "https://management.azure.com/"),
        ];

        let token: TokenResponse = ctx
            .http
            .fetch_json(ctx.http.post(&url).form(&form))
            .await
            .map_err(|e| ProviderError::AuthenticationFailed(e.to_string()))?;
        Ok(token.access_token)
    }
}

impl Default for AzureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for AzureAdapter {
    fn id(&self) -> &str {
        "azure"
    }

    fn display_name(&self) -> &str {
        "Microsoft Azure"
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
        let subscription = credentials.require("subscription")?;
        let token = self.token(ctx, credentials).await?;

        let first_url = format!(
            "{}/subscriptions/{subscription}/providers/Microsoft.Consumption/usageDetails",
            self.management
        );
        let mut request = ctx
            .http
            .get(&first_url)
            .query(&[("api-version", API_VERSION), ("$expand", "properties/meterDetails")]);

        let mut total = Decimal::ZERO;
        let mut period = None;
        let mut pages = 0_u32;
        loop {
            let page: UsagePage = ctx
                .http
                .fetch_json(request.header(AUTHORIZATION, bearer(&token)))
                .await?;
            pages += 1;

            total += page
                .value
                .iter()
                .map(|detail| detail.properties.payg_cost_in_usd)
                .sum::<Decimal>();

            if period.is_none() {
                if let Some(first) = page.value.first() {
                    let props = &first.properties;
                    period = Some((
                        parse_billing_date(props.service_period_start_date.as_deref().unwrap_or_default())?,
                        parse_billing_date(props.service_period_end_date.as_deref().unwrap_or_default())?,
                    ));
                }
            }

            match page.next_link {
                Some(next) => request = ctx.http.get(&next),
                None => break,
            }
        }

        debug!(pages, "Summed usage details");
        let (start, end) = period.unwrap_or((None, None));
        Ok(vec![CostItem::new(total, start, end)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        [
            ("password", "secret"),
            ("subscription", "sub-1"),
            ("client_id", "app"),
            ("tenant_id", "tenant"),
        ]
        .into_iter()
        .collect()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"access_token":"tok"}"#))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_cost_follows_next_link() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let usage_path = "/subscriptions/sub-1/providers/Microsoft.Consumption/usageDetails";
        let page_two = format!("{}/page2", server.uri());
        Mock::given(method("GET"))
            .and(path(usage_path))
            .and(query_param("api-version", "2021-10-01"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"value":[
                    {{"properties":{{"paygCostInUSD":1.25,"servicePeriodStartDate":"2024-03-01T00:00:00.0000000Z","servicePeriodEndDate":"2024-03-31T00:00:00.0000000Z"}}}},
                    {{"properties":{{"paygCostInUSD":2.5}}}}
                ],"nextLink":"{page_two}"}}"#
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"value":[{"properties":{"paygCostInUSD":0.25}}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = AzureAdapter::with_endpoint(server.uri());
        let items = adapter.cost(&FetchContext::new(), "corp", &creds()).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, Decimal::new(400, 2));
        assert_eq!(items[0].period_start, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(items[0].period_end, NaiveDate::from_ymd_opt(2024, 3, 31));
    }

    #[tokio::test]
    async fn test_rejected_token_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#))
            .mount(&server)
            .await;

        let adapter = AzureAdapter::with_endpoint(server.uri());
        let result = adapter.cost(&FetchContext::new(), "corp", &creds()).await;
        assert!(matches!(result, Err(ProviderError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_no_usage_is_zero_without_period() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":[]}"#))
            .mount(&server)
            .await;

        let adapter = AzureAdapter::with_endpoint(server.uri());
        let items = adapter.cost(&FetchContext::new(), "corp", &creds()).await.unwrap();
        assert_eq!(items[0].amount, Decimal::ZERO);
        assert_eq!(items[0].period_start, None);
    }
}
