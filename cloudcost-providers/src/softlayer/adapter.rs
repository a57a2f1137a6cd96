//! SoftLayer adapter.

use async_trait::async_trait;
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::parse_billing_date;
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use reqwest::RequestBuilder;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, instrument};

use super::api::{ChildItem, Invoice, InvoiceItem, NextInvoiceItem};

const DEFAULT_ENDPOINT: &str = "https://api.softlayer.com/rest/v3.1";
const PAAS_PREFIX: &str = "paas";

const SCHEMA: &[CredentialField] = &[CredentialField::secret("api_key", "API key")];

// ============================================================================
// Category Filter
// ============================================================================

/// Which billing categories an adapter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Only `paas*` categories (Bluemix).
    PaasOnly,
    /// Everything except `paas*` categories.
    ExcludePaas,
}

impl CategoryFilter {
    /// SoftLayer object filter operation.
    fn operation(self) -> String {
        match self {
            Self::PaasOnly => format!("^={PAAS_PREFIX}"),
            Self::ExcludePaas => format!("!^={PAAS_PREFIX}"),
        }
    }

    /// Returns true if items of `category` are kept.
    pub fn keeps(self, category: &str) -> bool {
        let paas = category.starts_with(PAAS_PREFIX);
        match self {
            Self::PaasOnly => paas,
            Self::ExcludePaas => !paas,
        }
    }

    fn object_filter(self, relation: &str) -> String {
        json!({ relation: { "categoryCode": { "operation": self.operation() } } }).to_string()
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// SoftLayer account billing adapter.
#[derive(Debug, Clone)]
pub struct SoftLayerAdapter {
    id: &'static str,
    display_name: &'static str,
    filter: CategoryFilter,
    endpoint: String,
}

impl SoftLayerAdapter {
    /// The `bluemix` adapter.
    pub fn bluemix() -> Self {
        Self::new("bluemix", "IBM Bluemix", CategoryFilter::PaasOnly)
    }

    /// The `softlayer` adapter.
    pub fn softlayer() -> Self {
        Self::new("softlayer", "IBM SoftLayer", CategoryFilter::ExcludePaas)
    }

    fn new(id: &'static str, display_name: &'static str, filter: CategoryFilter) -> Self {
        Self {
            id,
            display_name,
            filter,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Points the adapter at another base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn get(&self, ctx: &FetchContext, path: &str, auth: (&str, &str)) -> RequestBuilder {
        ctx.http
            .get(&format!("{}/{path}", self.endpoint))
            .basic_auth(auth.0, Some(auth.1))
    }

    async fn children_total(&self, ctx: &FetchContext, path: &str, auth: (&str, &str)) -> Result<Decimal, ProviderError> {
        let children: Vec<ChildItem> = ctx
            .http
            .fetch_json(self.get(ctx, path, auth).query(&[("objectMask", "mask[recurringFee]")]))
            .await?;
        Ok(children.iter().map(|c| c.recurring_fee).sum())
    }

    /// Expected cost of the running cycle.
    async fn next_billing(&self, ctx: &FetchContext, auth: (&str, &str)) -> Result<CostItem, ProviderError> {
        let request = self
            .get(ctx, "SoftLayer_Account/getNextInvoiceTopLevelBillingItems.json", auth)
            .query(&[
                ("objectMask", "mask[id,categoryCode,recurringFee,cycleStartDate,nextBillDate]".to_string()),
                ("objectFilter", self.filter.object_filter("nextInvoiceTopLevelBillingItems")),
            ]);
        let items: Vec<NextInvoiceItem> = ctx.http.fetch_json(request).await?;
        let items: Vec<_> = items.into_iter().filter(|i| self.filter.keeps(&i.category_code)).collect();

        let mut total = Decimal::ZERO;
        for item in &items {
            total += item.recurring_fee;
            total += self
                .children_total(
                    ctx,
                    &format!("SoftLayer_Billing_Item/{}/getNonZeroNextInvoiceChildren.json", item.id),
                    auth,
                )
                .await?;
        }

        let (start, end) = match items.first() {
            Some(first) => (
                parse_billing_date(first.cycle_start_date.as_deref().unwrap_or_default())?,
                parse_billing_date(first.next_bill_date.as_deref().unwrap_or_default())?,
            ),
            None => (None, None),
        };
        debug!(items = items.len(), "Summed next invoice");
        Ok(CostItem::new(total, start, end))
    }

    /// Cost of the latest issued recurring invoice.
    async fn previous_billing(&self, ctx: &FetchContext, auth: (&str, &str)) -> Result<CostItem, ProviderError> {
        let invoice: Invoice = ctx
            .http
            .fetch_json(self.get(ctx, "SoftLayer_Account/getLatestRecurringInvoice.json", auth))
            .await?;

        let request = self
            .get(ctx, &format!("SoftLayer_Billing_Invoice/{}/getInvoiceTopLevelItems.json", invoice.id), auth)
            .query(&[
                ("objectMask", "mask[id,categoryCode,recurringFee,billingItemId]".to_string()),
                ("objectFilter", self.filter.object_filter("invoiceTopLevelItems")),
            ]);
        let items: Vec<InvoiceItem> = ctx.http.fetch_json(request).await?;

        let mut total = Decimal::ZERO;
        for item in items.iter().filter(|i| self.filter.keeps(&i.category_code)) {
            total += item.recurring_fee;
            total += self
                .children_total(
                    ctx,
                    &format!("SoftLayer_Billing_Invoice_Item/{}/getNonZeroAssociatedChildren.json", item.id),
                    auth,
                )
                .await?;
        }

        Ok(CostItem::new(total, None, parse_billing_date(&invoice.create_date)?))
    }
}

#[async_trait]
impl ProviderAdapter for SoftLayerAdapter {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.display_name
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
        let auth = (account_name, credentials.require("api_key")?);
        Ok(vec![
            self.next_billing(ctx, auth).await?,
            self.previous_billing(ctx, auth).await?,
        ])
    }
}
