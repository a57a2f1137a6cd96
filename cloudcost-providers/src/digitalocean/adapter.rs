//! DigitalOcean adapter.

use async_trait::async_trait;
use cloudcost_core::{CostItem, CredentialField, Credentials, VmLifetimeRecord};
use cloudcost_fetch::dates::{month_start, next_month_start};
use cloudcost_fetch::host::http::{bearer, AUTHORIZATION};
use cloudcost_fetch::{FetchContext, LifetimeMap, ProviderAdapter, ProviderError};
use tracing::{debug, instrument};

use super::api::{Balance, Invoice, InvoiceItems, InvoiceList};

const DEFAULT_ENDPOINT: &str = "https://api.digitalocean.com";

const SCHEMA: &[CredentialField] = &[CredentialField::secret("api_key", "API token")];

/// DigitalOcean billing adapter.
#[derive(Debug, Clone)]
pub struct DigitalOceanAdapter {
    endpoint: String,
}

impl DigitalOceanAdapter {
    /// Creates an adapter for the public API.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates an adapter against another base URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    async fn latest_invoice(&self, ctx: &FetchContext, token: &str) -> Result<Option<Invoice>, ProviderError> {
        let url = format!("{}/v2/customers/my/invoices", self.endpoint);
        let list: InvoiceList = ctx
            .http
            .fetch_json(ctx.http.get(&url).header(AUTHORIZATION, bearer(token)))
            .await?;
        Ok(list
            .invoices
            .into_iter()
            .max_by(|a, b| a.invoice_period.cmp(&b.invoice_period)))
    }
}

impl Default for DigitalOceanAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for DigitalOceanAdapter {
    fn id(&self) -> &str {
        "digitalocean"
    }

    fn display_name(&self) -> &str {
        "DigitalOcean"
    }

    fn credential_schema(&self) -> &'static [CredentialField] {
        SCHEMA
    }

    fn supports_lifetime(&self) -> bool {
        true
    }

    #[instrument(skip(self, ctx, credentials))]
    async fn cost(
        &self,
        ctx: &FetchContext,
        account_name: &str,
        credentials: &Credentials,
    ) -> Result<Vec<CostItem>, ProviderError> {
        let token = credentials.require("api_key")?;
        let url = format!("{}/v2/customers/my/balance", self.endpoint);
        let balance: Balance = ctx
            .http
            .fetch_json(ctx.http.get(&url).header(AUTHORIZATION, bearer(token)))
            .await?;

        let today = ctx.today();
        Ok(vec![CostItem::new(
            balance.month_to_date_usage,
            Some(month_start(today)),
            Some(next_month_start(today)),
        )])
    }

    #[instrument(skip(self, ctx, credentials))]
    async fn life(
        &self,
        ctx: &FetchContext,
        account_name: &str,
        credentials: &Credentials,
    ) -> Result<LifetimeMap, ProviderError> {
        let token = credentials.require("api_key")?;
        let mut records = LifetimeMap::new();

        let Some(invoice) = self.latest_invoice(ctx, token).await? else {
            debug!("No invoices yet");
            return Ok(records);
        };

        let mut next = Some(format!(
            "{}/v2/customers/my/invoices/{}",
            self.endpoint, invoice.invoice_uuid
        ));
        while let Some(url) = next.take() {
            let page: InvoiceItems = ctx
                .http
                .fetch_json(ctx.http.get(&url).header(AUTHORIZATION, bearer(token)))
                .await?;

            for item in &page.invoice_items {
                let Some(hours) = item.hours() else { continue };
                records
                    .entry(item.machine_key().to_string())
                    .and_modify(|r: &mut VmLifetimeRecord| r.hours_alive += hours)
                    .or_insert_with(|| VmLifetimeRecord {
                        vm_name: item.description.clone(),
                        hours_alive: hours,
                        provider: self.id().to_string(),
                        account: account_name.to_string(),
                        bill: invoice.invoice_uuid.clone(),
                    });
            }
            next = page.links.pages.next;
        }

        debug!(machines = records.len(), invoice = %invoice.invoice_uuid, "Collected hourly items");
        Ok(records)
    }
}
