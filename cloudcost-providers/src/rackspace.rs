//! Rackspace provider implementation.
//!
//! Exchanges the API key for an identity token, then reads the estimated
//! charges of the running billing period. The account name is the
//! Rackspace username.

use async_trait::async_trait;
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::parse_billing_date;
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

const IDENTITY_ENDPOINT: &str = "https://identity.api.rackspacecloud.com";
const BILLING_ENDPOINT: &str = "https://billing.api.rackspacecloud.com";

const SCHEMA: &[CredentialField] = &[
    CredentialField::secret("api_key", "API key"),
    CredentialField::public("billing_number", "Billing account number"),
];

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: Token,
}

#[derive(Debug, Deserialize)]
struct Token {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargesResponse {
    estimated_charges: EstimatedCharges,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimatedCharges {
    charge_total: Decimal,
    #[serde(default)]
    current_billing_period_start_date: String,
    #[serde(default)]
    current_billing_period_end_date: String,
}

/// Rackspace estimated-charges adapter.
#[derive(Debug, Clone)]
pub struct RackspaceAdapter {
    identity: String,
    billing: String,
}

impl RackspaceAdapter {
    /// Creates an adapter for the public endpoints.
    pub fn new() -> Self {
        Self::with_endpoints(IDENTITY_ENDPOINT, BILLING_ENDPOINT)
    }

    /// Creates an adapter using one base URL for identity and billing.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self::with_endpoints(endpoint.clone(), endpoint)
    }

    /// Creates an adapter against other identity and billing hosts.
    pub fn with_endpoints(identity: impl Into<String>, billing: impl Into<String>) -> Self {
        Self {
            identity: identity.into().trim_end_matches('/').to_string(),
            billing: billing.into().trim_end_matches('/').to_string(),
        }
    }

    async fn token(&self, ctx: &FetchContext, username: &str, api_key: &str) -> Result<String, ProviderError> {
        let body = json!({
            "auth": {
                "RAX-KSKEY:apiKeyCredentials": {
                    "username": username,
                    "apiKey": api_key,
                }
            }
        });
        let url = format!("{}/v2.0/tokens", self.identity);
        let identity: IdentityResponse = ctx
            .http
            .fetch_json(ctx.http.post(&url).json(&body))
            .await
            .map_err(|e| ProviderError::AuthenticationFailed(e.to_string()))?;
        Ok(identity.access.token.id)
    }
}

impl Default for RackspaceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for RackspaceAdapter {
    fn id(&self) -> &str {
        "rackspace"
    }

    fn display_name(&self) -> &str {
        "Rackspace"
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
        let token = self
            .token(ctx, account_name, credentials.require("api_key")?)
            .await?;

        let url = format!(
            "{}/v2/accounts/{}/estimated_charges",
            self.billing,
            credentials.require("billing_number")?
        );
        let charges: ChargesResponse = ctx
            .http
            .fetch_json(
                ctx.http
                    .get(&url)
                    .header(ACCEPT, "application/json")
                    .header("X-Auth-Token", token),
            )
            .await?;

        let charges = charges.estimated_charges;
        Ok(vec![CostItem::new(
            charges.charge_total,
            parse_billing_date(&charges.current_billing_period_start_date)?,
            parse_billing_date(&charges.current_billing_period_end_date)?,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_token_then_estimated_charges() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2.0/tokens"))
            .and(body_partial_json(json!({
                "auth": {"RAX-KSKEY:apiKeyCredentials": {"username": "ops-user", "apiKey": "rk"}}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"access":{"token":{"id":"rax-token"}}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/accounts/12345/estimated_charges"))
            .and(header("x-auth-token", "rax-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"estimatedCharges":{"chargeTotal":"77.10","currentBillingPeriodStartDate":"2024-03-05","currentBillingPeriodEndDate":"2024-04-04"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let creds: Credentials = [("api_key", "rk"), ("billing_number", "12345")].into_iter().collect();
        let items = RackspaceAdapter::with_endpoint(server.uri())
            .cost(&FetchContext::new(), "ops-user", &creds)
            .await
            .unwrap();

        assert_eq!(items[0].amount, Decimal::new(7710, 2));
        assert_eq!(items[0].period_start, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(items[0].period_end, NaiveDate::from_ymd_opt(2024, 4, 4));
    }

    #[tokio::test]
    async fn test_identity_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"unauthorized":{}}"#))
            .mount(&server)
            .await;

        let creds: Credentials = [("api_key", "bad"), ("billing_number", "1")].into_iter().collect();
        let result = RackspaceAdapter::with_endpoint(server.uri())
            .cost(&FetchContext::new(), "ops-user", &creds)
            .await;
        assert!(matches!(result, Err(ProviderError::AuthenticationFailed(_))));
    }
}
