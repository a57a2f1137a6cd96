//! Heroku provider implementation.
//!
//! Reads the account invoice list and reports the invoice of the current
//! month. Heroku reports totals in cents.

use async_trait::async_trait;
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::parse_billing_date;
use cloudcost_fetch::host::http::{bearer, AUTHORIZATION};
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

const DEFAULT_ENDPOINT: &str = "https://api.heroku.com";
const ACCEPT_V3: &str = "application/vnd.heroku+json; version=3";

const SCHEMA: &[CredentialField] = &[CredentialField::secret("api_key", "API key")];

#[derive(Debug, Deserialize)]
struct Invoice {
    period_start: String,
    #[serde(default)]
    period_end: String,
    total: Decimal,
}

/// Heroku invoice adapter.
#[derive(Debug, Clone)]
pub struct HerokuAdapter {
    endpoint: String,
}

impl HerokuAdapter {
    /// Creates an adapter for the platform API.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates an adapter against another base URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for HerokuAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for HerokuAdapter {
    fn id(&self) -> &str {
        "heroku"
    }

    fn display_name(&self) -> &str {
        "Heroku"
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
        let token = credentials.require("api_key")?;
        let url = format!("{}/account/invoices", self.endpoint);
        let invoices: Vec<Invoice> = ctx
            .http
            .fetch_json(
                ctx.http
                    .get(&url)
                    .header(AUTHORIZATION, bearer(token))
                    .header(ACCEPT, ACCEPT_V3),
            )
            .await?;

        let month = ctx.today().format("%Y-%m").to_string();
        let Some(invoice) = invoices.iter().find(|i| i.period_start.starts_with(&month)) else {
            debug!(%month, "No invoice for the current month");
            return Ok(Vec::new());
        };

        Ok(vec![CostItem::new(
            invoice.total / Decimal::ONE_HUNDRED,
            parse_billing_date(&invoice.period_start)?,
            parse_billing_date(&invoice.period_end)?,
        )])
    }
}
