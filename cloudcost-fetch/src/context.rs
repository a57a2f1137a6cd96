//! Fetch context providing access to host services.
//!
//! The context is passed to every adapter call and bundles the HTTP client,
//! the process runner and the currency converter.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use cloudcost_core::CurrencyConverter;

use crate::currency::StaticRateConverter;
use crate::host::{http::HttpClient, process::ProcessRunner};

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for host services.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Timeout for single HTTP requests.
    pub http_timeout: Duration,
    /// Timeout for vendor CLI invocations.
    pub process_timeout: Duration,
    /// Fixed "today" for billing period math. Defaults to the local date.
    pub today: Option<NaiveDate>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            process_timeout: Duration::from_secs(60),
            today: None,
        }
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to provider adapters.
pub struct FetchContext {
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Process runner for vendor CLIs.
    pub process: Arc<ProcessRunner>,
    /// Converter into the report currency.
    pub currency: Arc<dyn CurrencyConverter>,
    /// Host service settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context with default host services.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// The day billing periods are computed from.
    pub fn today(&self) -> NaiveDate {
        self.settings
            .today
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Default)]
pub struct FetchContextBuilder {
    http: Option<Arc<HttpClient>>,
    process: Option<Arc<ProcessRunner>>,
    currency: Option<Arc<dyn CurrencyConverter>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the process runner.
    #[must_use]
    pub fn process(mut self, process: Arc<ProcessRunner>) -> Self {
        self.process = Some(process);
        self
    }

    /// Sets the currency converter.
    #[must_use]
    pub fn currency(mut self, currency: Arc<dyn CurrencyConverter>) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.settings.http_timeout = timeout;
        self
    }

    /// Pins the date used for billing period math.
    #[must_use]
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.settings.today = Some(today);
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        let settings = self.settings;
        FetchContext {
            http: self
                .http
                .unwrap_or_else(|| Arc::new(HttpClient::with_timeout(settings.http_timeout))),
            process: self
                .process
                .unwrap_or_else(|| Arc::new(ProcessRunner::with_timeout(settings.process_timeout))),
            currency: self
                .currency
                .unwrap_or_else(|| Arc::new(StaticRateConverter::new())),
            settings,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = FetchContext::builder()
            .http_timeout(Duration::from_secs(5))
            .build();
        assert_eq!(ctx.settings.http_timeout, Duration::from_secs(5));
        assert_eq!(ctx.process.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_pinned_today() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let ctx = FetchContext::builder().today(day).build();
        assert_eq!(ctx.today(), day);
    }

    #[test]
    fn test_default_context_knows_only_usd() {
        let ctx = FetchContext::new();
        assert!(ctx.currency.to_report_currency(rust_decimal::Decimal::ONE, "USD").is_ok());
        assert!(ctx.currency.to_report_currency(rust_decimal::Decimal::ONE, "GBP").is_err());
    }
}
