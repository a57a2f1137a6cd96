//! Top-level runs: one invocation is one run.

use std::path::{Path, PathBuf};

use cloudcost_core::FailureSet;
use cloudcost_store::AccountFilter;
use tracing::{error, info, warn};

use crate::delivery::{DeliveryPipeline, DeliveryReport};
use crate::engine::{AggregationEngine, LifetimeOutcome, RunOutcome};
use crate::error::{EngineError, ExportError};
use crate::export::write_export;

// ============================================================================
// Cost Run
// ============================================================================

/// Result of a [`CostRun`].
#[derive(Debug)]
pub struct CostRunSummary {
    /// Engine output.
    pub outcome: RunOutcome,
    /// Export file written for this run, or why it could not be written.
    pub export: Result<PathBuf, ExportError>,
    /// Delivery result. `None` when dry or without a sink.
    pub delivery: Option<DeliveryReport>,
}

impl CostRunSummary {
    /// Path of the written export, if any.
    pub fn export_path(&self) -> Option<&Path> {
        self.export.as_deref().ok()
    }
}

/// Aggregates costs, writes the export and delivers everything.
#[derive(Debug)]
pub struct CostRun {
    engine: AggregationEngine,
    delivery: Option<DeliveryPipeline>,
    export_dir: PathBuf,
    dry: bool,
}

impl CostRun {
    /// Creates a run writing its export to `export_dir`.
    pub fn new(engine: AggregationEngine, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            delivery: None,
            export_dir: export_dir.into(),
            dry: false,
        }
    }

    /// Sets the delivery pipeline.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryPipeline) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Dry mode writes the export but delivers nothing.
    #[must_use]
    pub fn dry(mut self, dry: bool) -> Self {
        self.dry = dry;
        self
    }

    /// Executes the run.
    ///
    /// # Errors
    ///
    /// Fails only if the store is unavailable. A failed export write fails
    /// the upload target and is reported in the summary with the delivery
    /// errors.
    pub async fn execute(&self, filter: &AccountFilter) -> Result<CostRunSummary, EngineError> {
        let outcome = self.engine.run(filter).await?;
        let export = write_export(&outcome.report, &self.export_dir, self.engine.today());
        if let Err(e) = &export {
            error!(dir = %self.export_dir.display(), error = %e, "Export failed");
        }

        let delivery = match (&self.delivery, self.dry) {
            (_, true) => {
                info!("Dry run, skipping delivery");
                None
            }
            (None, false) => {
                warn!("No messaging sink configured, skipping delivery");
                None
            }
            (Some(pipeline), false) => {
                let mut report = pipeline
                    .deliver(&outcome.failures, &outcome.anomalies, export.as_deref().ok())
                    .await;
                if let Err(e) = &export {
                    report.record_missing_artifact(e);
                }
                Some(report)
            }
        };

        Ok(CostRunSummary {
            outcome,
            export,
            delivery,
        })
    }
}

// ============================================================================
// Lifetime Run
// ============================================================================

/// Result of a [`LifetimeRun`].
#[derive(Debug)]
pub struct LifetimeRunSummary {
    /// Engine output.
    pub outcome: LifetimeOutcome,
    /// Delivery result. `None` when dry or without a sink.
    pub delivery: Option<DeliveryReport>,
}

/// Checks machine lifetimes and delivers the anomaly notification.
#[derive(Debug)]
pub struct LifetimeRun {
    engine: AggregationEngine,
    delivery: Option<DeliveryPipeline>,
    dry: bool,
}

impl LifetimeRun {
    /// Creates a run.
    pub fn new(engine: AggregationEngine) -> Self {
        Self {
            engine,
            delivery: None,
            dry: false,
        }
    }

    /// Sets the delivery pipeline.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryPipeline) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Dry mode delivers nothing.
    #[must_use]
    pub fn dry(mut self, dry: bool) -> Self {
        self.dry = dry;
        self
    }

    /// Executes the run.
    ///
    /// # Errors
    ///
    /// Fails only if the store is unavailable.
    pub async fn execute(&self, filter: &AccountFilter) -> Result<LifetimeRunSummary, EngineError> {
        let outcome = self.engine.run_lifetime(filter).await?;

        let delivery = match (&self.delivery, self.dry) {
            (_, true) => {
                info!("Dry run, skipping delivery");
                None
            }
            (None, false) => {
                warn!("No messaging sink configured, skipping delivery");
                None
            }
            (Some(pipeline), false) => Some(
                pipeline
                    .deliver(&FailureSet::new(), &outcome.anomalies, None)
                    .await,
            ),
        };

        Ok(LifetimeRunSummary { outcome, delivery })
    }
}
