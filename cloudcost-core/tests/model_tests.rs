//! Integration tests for core model types.

use chrono::NaiveDate;
use cloudcost_core::{Account, CostItem, Credentials, ProviderResult, Report};
use rust_decimal::Decimal;

#[test]
fn test_report_serialization_roundtrip() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

    let mut report = Report::new();
    report.append(
        "foo",
        "A",
        &[CostItem::new(Decimal::new(1234, 2), Some(start), Some(end)).with_balance("5.00 USD")],
    );

    let json = serde_json::to_string(&report).unwrap();
    let parsed: Report = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
    assert_eq!(parsed.rows()[0].period_start, Some(start));
}

#[test]
fn test_provider_result_account_access() {
    let account = Account::new("bar", "B", Credentials::new());
    let result = ProviderResult::Failure {
        account: account.clone(),
        error: "connection refused".to_string(),
    };
    assert!(!result.is_success());
    assert_eq!(result.account(), &account);
}
