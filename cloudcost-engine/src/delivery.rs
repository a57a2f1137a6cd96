//! Delivery pipeline.
//!
//! Targets are delivered in a fixed order (failures, anomalies, upload),
//! each with its own retry budget. One exhausted target never stops the
//! others.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use cloudcost_core::{FailureSet, VmLifetimeRecord};
use cloudcost_fetch::RetryPolicy;
use tracing::{error, info};

use crate::error::{DeliveryError, DeliveryTarget, ExportError, SinkError};
use crate::sink::{MessagingSink, Notification};

/// What a delivery pass did.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Targets delivered successfully.
    pub delivered: Vec<DeliveryTarget>,
    /// Targets that exhausted their retries.
    pub errors: Vec<DeliveryError>,
}

impl DeliveryReport {
    /// Returns true if no target failed.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records the upload as failed because no export was written.
    pub(crate) fn record_missing_artifact(&mut self, err: &ExportError) {
        self.errors.push(DeliveryError {
            target: DeliveryTarget::Upload,
            attempts: 0,
            source: SinkError::ArtifactUnavailable(err.to_string()),
        });
    }

    fn record(&mut self, target: DeliveryTarget, result: Result<(), DeliveryError>) {
        match result {
            Ok(()) => self.delivered.push(target),
            Err(e) => self.errors.push(e),
        }
    }
}

/// Sends run results to a messaging sink with bounded retries.
#[derive(Clone)]
pub struct DeliveryPipeline {
    sink: Arc<dyn MessagingSink>,
    policy: RetryPolicy,
}

impl DeliveryPipeline {
    /// Creates a pipeline.
    pub fn new(sink: Arc<dyn MessagingSink>, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    /// Retry policy per target.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Delivers everything that has content. Empty targets are not invoked.
    pub async fn deliver(
        &self,
        failures: &FailureSet,
        anomalies: &[VmLifetimeRecord],
        artifact: Option<&Path>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if !failures.is_empty() {
            report.record(DeliveryTarget::Failures, self.notify_failures(failures).await);
        }
        if !anomalies.is_empty() {
            report.record(DeliveryTarget::Anomalies, self.notify_anomalies(anomalies).await);
        }
        if let Some(path) = artifact {
            report.record(DeliveryTarget::Upload, self.upload(path).await);
        }

        info!(
            delivered = report.delivered.len(),
            failed = report.errors.len(),
            "Delivery finished"
        );
        report
    }

    /// Posts the failure notification.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] once retries are exhausted.
    pub async fn notify_failures(&self, failures: &FailureSet) -> Result<(), DeliveryError> {
        let notification = Notification::failures(failures);
        self.attempt(DeliveryTarget::Failures, || self.sink.post_notification(&notification))
            .await
    }

    /// Posts the long-running machine notification.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] once retries are exhausted.
    pub async fn notify_anomalies(&self, anomalies: &[VmLifetimeRecord]) -> Result<(), DeliveryError> {
        let notification = Notification::anomalies(anomalies);
        self.attempt(DeliveryTarget::Anomalies, || self.sink.post_notification(&notification))
            .await
    }

    /// Uploads the export and posts a message carrying it. Both steps are
    /// repeated together on failure.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] once retries are exhausted.
    pub async fn upload(&self, path: &Path) -> Result<(), DeliveryError> {
        self.attempt(DeliveryTarget::Upload, || async {
            let file_id = self.sink.upload_artifact(path).await?;
            self.sink
                .post_notification(&Notification::artifact(file_id))
                .await
        })
        .await
    }

    async fn attempt<F, Fut>(&self, target: DeliveryTarget, operation: F) -> Result<(), DeliveryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), SinkError>>,
    {
        self.policy
            .run(&target.to_string(), operation)
            .await
            .map_err(|exhausted| {
                error!(%target, attempts = exhausted.attempts, error = %exhausted.last_error, "Delivery exhausted");
                DeliveryError {
                    target,
                    attempts: exhausted.attempts,
                    source: exhausted.last_error,
                }
            })
    }
}

impl std::fmt::Debug for DeliveryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryPipeline")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
