//! Amazon Web Services provider implementation.
//!
//! Costs come from Cost Explorer through the `aws` CLI. Credentials are
//! handed to the child process through its environment.

use async_trait::async_trait;
use chrono::NaiveDate;
use cloudcost_core::{CostItem, CredentialField, Credentials};
use cloudcost_fetch::dates::{month_start, next_month_start};
use cloudcost_fetch::{FetchContext, ProviderAdapter, ProviderError};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

const DEFAULT_COMMAND: &str = "aws";

const SCHEMA: &[CredentialField] = &[
    CredentialField::public("access_key_id", "Access key ID"),
    CredentialField::secret("secret_access_key", "Secret access key"),
];

// ============================================================================
// CLI Output
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CostAndUsage {
    results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultByTime {
    total: Total,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Total {
    blended_cost: Metric,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Metric {
    amount: Decimal,
}

/// Extracts the blended cost of the first period from `get-cost-and-usage` output.
pub fn parse_blended_cost(stdout: &str) -> Result<Decimal, ProviderError> {
    let parsed: CostAndUsage = serde_json::from_str(stdout)?;
    parsed
        .results_by_time
        .into_iter()
        .next()
        .map(|r| r.total.blended_cost.amount)
        .ok_or_else(|| ProviderError::missing_field("ResultsByTime"))
}

fn time_period(start: NaiveDate, end: NaiveDate) -> String {
    format!("Start={},End={}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
}

// ============================================================================
// Adapter
// ============================================================================

/// AWS Cost Explorer adapter.
#[derive(Debug, Clone)]
pub struct AmazonAdapter {
    command: String,
}

impl AmazonAdapter {
    /// Creates an adapter using `aws` from `PATH`.
    pub fn new() -> Self {
        Self::with_command(DEFAULT_COMMAND)
    }

    /// Creates an adapter using another CLI binary.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for AmazonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for AmazonAdapter {
    fn id(&self) -> &str {
        "amazon"
    }

    fn display_name(&self) -> &str {
        "Amazon Web Services"
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
        let key_id = credentials.require("access_key_id")?;
        let secret = credentials.require("secret_access_key")?;

        let today = ctx.today();
        let (start, end) = (month_start(today), next_month_start(today));
        let period = time_period(start, end);

        let output = ctx
            .process
            .run_with_env(
                &self.command,
                &[
                    "ce",
                    "get-cost-and-usage",
                    "--time-period",
                    &period,
                    "--granularity",
                    "MONTHLY",
                    "--metrics",
                    "BlendedCost",
                    "--output",
                    "json",
                ],
                &[("AWS_ACCESS_KEY_ID", key_id), ("AWS_SECRET_ACCESS_KEY", secret)],
            )
            .await?;

        let amount = parse_blended_cost(output.stdout_if_success()?)?;
        Ok(vec![CostItem::new(amount, Some(start), Some(end))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudcost_fetch::ProcessError;

    const OUTPUT: &str = r#"{
        "GroupDefinitions": [],
        "ResultsByTime": [
            {
                "TimePeriod": {"Start": "2024-03-01", "End": "2024-04-01"},
                "Total": {"BlendedCost": {"Amount": "812.3377", "Unit": "USD"}},
                "Groups": [],
                "Estimated": true
            }
        ],
        "DimensionValueAttributes": []
    }"#;

    #[test]
    fn test_parse_blended_cost() {
        assert_eq!(parse_blended_cost(OUTPUT).unwrap(), Decimal::new(8_123_377, 4));
    }

    #[test]
    fn test_parse_empty_results() {
        let result = parse_blended_cost(r#"{"ResultsByTime":[]}"#);
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_time_period_format() {
        let start = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(time_period(start, end), "Start=2024-12-01,End=2025-01-01");
    }

    #[tokio::test]
    async fn test_missing_cli_is_process_error() {
        let adapter = AmazonAdapter::with_command("definitely-not-the-aws-cli");
        let creds: Credentials = [("access_key_id", "AKIA"), ("secret_access_key", "s")]
            .into_iter()
            .collect();
        let result = adapter.cost(&FetchContext::new(), "prod", &creds).await;
        assert!(matches!(result, Err(ProviderError::Process(ProcessError::NotFound(_)))));
    }
}
