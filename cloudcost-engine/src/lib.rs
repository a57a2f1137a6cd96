// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `cloudcost` Engine
//!
//! Orchestration for cost runs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────┐
//! │ AccountStore │──▶│ AggregationEngine │──▶│ CSV export   │
//! └──────────────┘   │  (per account:    │   └──────┬───────┘
//!                    │   adapter.cost()) │          │
//! ┌──────────────┐   └─────────┬─────────┘   ┌──────▼───────┐
//! │ Registry     │────────────▶│             │ Delivery     │──▶ MessagingSink
//! └──────────────┘             └────────────▶│ (retried)    │
//!                                            └──────────────┘
//! ```
//!
//! - [`AggregationEngine`] turns accounts into a [`RunOutcome`]
//! - [`export`] renders the report to CSV
//! - [`DeliveryPipeline`] posts failures, anomalies and the export
//! - [`CostRun`] / [`LifetimeRun`] tie it together; dry mode skips delivery

pub mod delivery;
pub mod engine;
pub mod error;
pub mod export;
pub mod run;
pub mod sink;

pub use delivery::{DeliveryPipeline, DeliveryReport};
pub use engine::{AggregationEngine, EngineSettings, LifetimeOutcome, RunOutcome};
pub use error::{DeliveryError, DeliveryTarget, DispatchError, EngineError, ExportError, SinkError};
pub use export::{export_file_name, export_rows, write_csv, write_export, ExportRow, EXPORT_HEADER};
pub use run::{CostRun, CostRunSummary, LifetimeRun, LifetimeRunSummary};
pub use sink::{Attachment, MattermostSink, MessagingSink, Notification, NotificationField};
