//! CLI output formatting tests.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use cloudcost_core::{Account, CostItem, Credentials};
    use cloudcost_engine::{CostRunSummary, DeliveryReport, DeliveryTarget, ExportError, RunOutcome};
    use rust_decimal::Decimal;
    use std::path::PathBuf;

    fn summary() -> CostRunSummary {
        let mut outcome = RunOutcome::default();
        outcome
            .report
            .append("heroku", "main", &[CostItem::new(Decimal::new(1234, 2), None, None)]);
        outcome.failures.record("azure", "prod", "token expired");
        outcome.succeeded = 1;
        outcome.accounts_seen = 2;
        CostRunSummary {
            outcome,
            export: Ok(PathBuf::from("/tmp/cloudcost2024-02-01.csv")),
            delivery: Some(DeliveryReport {
                delivered: vec![DeliveryTarget::Failures, DeliveryTarget::Upload],
                errors: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_cost_run_text() {
        let text = TextFormatter::new(false).format_cost_run(&summary());
        assert!(text.contains("heroku"));
        assert!(text.contains("12.34"));
        assert!(text.contains("Total: 12.34 USD (1 rows from 1 accounts)"));
        assert!(text.contains("azure/prod: token expired"));
        assert!(text.contains("Export: /tmp/cloudcost2024-02-01.csv"));
        assert!(text.contains("✓ upload"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_colors_applied() {
        let text = TextFormatter::new(true).format_cost_run(&summary());
        assert!(text.contains("\x1b[31m✗\x1b[0m"));
    }

    #[test]
    fn test_export_failure_text() {
        let mut summary = summary();
        summary.export = Err(ExportError::Io(std::io::Error::other("not a directory")));
        let text = TextFormatter::new(false).format_cost_run(&summary);
        assert!(text.contains("Export failed: IO error: not a directory"));
        assert!(!text.contains("Export: "));
    }

    #[test]
    fn test_dry_delivery_text() {
        let mut summary = summary();
        summary.delivery = None;
        let text = TextFormatter::new(false).format_cost_run(&summary);
        assert!(text.contains("Delivery: skipped"));
    }

    #[test]
    fn test_accounts_hide_values() {
        let creds: Credentials = [("api_key", "s3cret")].into_iter().collect();
        let accounts = vec![Account::new("heroku", "main", creds).with_enabled(false)];
        let text = TextFormatter::new(false).format_accounts(&accounts);
        assert!(text.contains("api_key"));
        assert!(text.contains("disabled"));
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn test_no_accounts() {
        let text = TextFormatter::new(false).format_accounts(&[]);
        assert_eq!(text, "No accounts configured\n");
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use cloudcost_core::CostItem;
    use cloudcost_engine::{CostRunSummary, RunOutcome};
    use cloudcost_providers::ProviderRegistry;
    use rust_decimal::Decimal;
    use std::path::PathBuf;

    #[test]
    fn test_cost_run_json() {
        let mut outcome = RunOutcome::default();
        outcome
            .report
            .append("heroku", "main", &[CostItem::new(Decimal::new(5, 0), None, None)]);
        let summary = CostRunSummary {
            outcome,
            export: Ok(PathBuf::from("/tmp/x.csv")),
            delivery: None,
        };

        let json = JsonFormatter::new(false).format_cost_run(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], "5.00");
        assert_eq!(value["rows"][0]["current_invoice"], "5.00");
        assert_eq!(value["exportPath"], "/tmp/x.csv");
        assert!(value.get("delivery").is_none());
    }

    #[test]
    fn test_providers_json() {
        let infos = ProviderRegistry::builtin().infos();
        let json = JsonFormatter::new(true).format_providers(&infos).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let digitalocean = value
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"] == "digitalocean")
            .unwrap();
        assert_eq!(digitalocean["lifetime"], true);
    }
}
