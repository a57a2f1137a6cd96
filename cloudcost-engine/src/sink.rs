//! Messaging sink: notifications and artifact uploads.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cloudcost_core::{FailureSet, VmLifetimeRecord};
use cloudcost_fetch::{bearer, HttpClient, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::SinkError;

/// Attachment color for failures.
pub const FAILURE_COLOR: &str = "#FF0000";

/// Attachment color for long-running machines.
pub const ANOMALY_COLOR: &str = "#FF0000";

// ============================================================================
// Notification Model
// ============================================================================

/// A key/value field of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationField {
    /// Field name.
    pub title: String,
    /// Field value.
    pub value: String,
    /// Rendered side by side with other short fields.
    pub short: bool,
}

impl NotificationField {
    fn short(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
            short: true,
        }
    }

    fn long(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
            short: false,
        }
    }
}

/// A titled block with a severity color and fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Title line.
    pub title: String,
    /// Severity color, e.g. `#FF0000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Key/value fields.
    pub fields: Vec<NotificationField>,
}

/// A post to the sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Message text (Markdown).
    pub message: String,
    /// Attachments.
    pub attachments: Vec<Attachment>,
    /// Previously uploaded files to attach.
    pub file_ids: Vec<String>,
}

impl Notification {
    /// One attachment per failed account.
    pub fn failures(failures: &FailureSet) -> Self {
        let attachments = failures
            .records()
            .iter()
            .map(|f| Attachment {
                title: "An account has failed to report".to_string(),
                color: Some(FAILURE_COLOR.to_string()),
                fields: vec![
                    NotificationField::short("Provider", &f.provider),
                    NotificationField::short("Account", &f.account),
                    NotificationField::long("Error", format!("```\n{}\n```", f.error)),
                ],
            })
            .collect();
        Self {
            message: "# Failures".to_string(),
            attachments,
            file_ids: Vec::new(),
        }
    }

    /// One attachment per long-running machine.
    pub fn anomalies(records: &[VmLifetimeRecord]) -> Self {
        let attachments = records
            .iter()
            .map(|r| Attachment {
                title: "You have been billed for a VM alive longer than 7 days".to_string(),
                color: Some(ANOMALY_COLOR.to_string()),
                fields: vec![
                    NotificationField::short("VM Name", &r.vm_name),
                    NotificationField::short("Provider", &r.provider),
                    NotificationField::short("Account", &r.account),
                    NotificationField::short("Bill/Invoice", &r.bill),
                    NotificationField::short("Hours Billed", format!("{:.2}", r.hours_alive)),
                ],
            })
            .collect();
        Self {
            message: "# Machines billed for > 7 days".to_string(),
            attachments,
            file_ids: Vec::new(),
        }
    }

    /// Message announcing an uploaded export.
    pub fn artifact(file_id: impl Into<String>) -> Self {
        Self {
            message: "### Today's cloud cost!".to_string(),
            attachments: Vec::new(),
            file_ids: vec![file_id.into()],
        }
    }
}

// ============================================================================
// Sink Trait
// ============================================================================

/// A chat or messaging system that receives run results.
#[async_trait]
pub trait MessagingSink: Send + Sync {
    /// Uploads a file and returns the sink's reference id.
    async fn upload_artifact(&self, path: &Path) -> Result<String, SinkError>;

    /// Posts a notification.
    async fn post_notification(&self, notification: &Notification) -> Result<(), SinkError>;
}

// ============================================================================
// Mattermost
// ============================================================================

/// Mattermost REST API v4 sink.
pub struct MattermostSink {
    http: Arc<HttpClient>,
    server: String,
    channel_id: String,
    token: String,
}

#[derive(Serialize)]
struct PostBody<'a> {
    channel_id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    file_ids: &'a [String],
    props: PostProps<'a>,
}

#[derive(Serialize)]
struct PostProps<'a> {
    #[serde(skip_serializing_if = "<[Attachment]>::is_empty")]
    attachments: &'a [Attachment],
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    file_infos: Vec<FileInfo>,
}

#[derive(Deserialize)]
struct FileInfo {
    id: String,
}

impl MattermostSink {
    /// Creates a sink posting to `channel_id` on `server`.
    pub fn new(
        http: Arc<HttpClient>,
        server: impl Into<String>,
        channel_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            server: server.into().trim_end_matches('/').to_string(),
            channel_id: channel_id.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4/{path}", self.server)
    }
}

impl std::fmt::Debug for MattermostSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MattermostSink")
            .field("server", &self.server)
            .field("channel_id", &self.channel_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessagingSink for MattermostSink {
    #[instrument(skip(self))]
    async fn upload_artifact(&self, path: &Path) -> Result<String, SinkError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "export.csv".to_string(), |n| n.to_string_lossy().into_owned());
        let form = Form::new()
            .text("channel_id", self.channel_id.clone())
            .part("files", Part::bytes(bytes).file_name(file_name));

        let response: UploadResponse = self
            .http
            .fetch_json(
                self.http
                    .post(&self.url("files"))
                    .header(AUTHORIZATION, bearer(&self.token))
                    .multipart(form),
            )
            .await?;

        let id = response
            .file_infos
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| SinkError::InvalidResponse("upload returned no file id".to_string()))?;
        debug!(file_id = %id, "Artifact uploaded");
        Ok(id)
    }

    #[instrument(skip(self, notification), fields(attachments = notification.attachments.len()))]
    async fn post_notification(&self, notification: &Notification) -> Result<(), SinkError> {
        let body = PostBody {
            channel_id: &self.channel_id,
            message: &notification.message,
            file_ids: &notification.file_ids,
            props: PostProps {
                attachments: &notification.attachments,
            },
        };
        self.http
            .send_checked(
                self.http
                    .post(&self.url("posts"))
                    .header(AUTHORIZATION, bearer(&self.token))
                    .json(&body),
            )
            .await?;
        debug!("Notification posted");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(server: &MockServer) -> MattermostSink {
        MattermostSink::new(Arc::new(HttpClient::new()), server.uri(), "chan", "tok")
    }

    #[test]
    fn test_failure_notification() {
        let mut failures = FailureSet::new();
        failures.record("bar", "B", "connection refused");

        let n = Notification::failures(&failures);
        assert_eq!(n.message, "# Failures");
        assert_eq!(n.attachments.len(), 1);
        assert_eq!(n.attachments[0].color.as_deref(), Some(FAILURE_COLOR));
        assert_eq!(n.attachments[0].fields[2].value, "```\nconnection refused\n```");
        assert!(!n.attachments[0].fields[2].short);
    }

    #[test]
    fn test_anomaly_notification() {
        let record = VmLifetimeRecord {
            vm_name: "web-1".to_string(),
            hours_alive: 200.0,
            provider: "digitalocean".to_string(),
            account: "ops".to_string(),
            bill: "inv-9".to_string(),
        };
        let n = Notification::anomalies(&[record]);
        assert_eq!(n.message, "# Machines billed for > 7 days");
        assert_eq!(n.attachments[0].color.as_deref(), Some(ANOMALY_COLOR));
        assert_eq!(n.attachments[0].fields[4].value, "200.00");
    }

    #[tokio::test]
    async fn test_post_notification() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/posts"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(serde_json::json!({
                "channel_id": "chan",
                "message": "# Failures",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "p1"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut failures = FailureSet::new();
        failures.record("bar", "B", "boom");
        sink(&server)
            .post_notification(&Notification::failures(&failures))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/files"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "file_infos": [{"id": "file-1"}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cloudcost2024-03-09.csv");
        std::fs::write(&file, "Provider\n").unwrap();

        let id = sink(&server).upload_artifact(&file).await.unwrap();
        assert_eq!(id, "file-1");
    }

    #[tokio::test]
    async fn test_upload_without_file_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/files"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"file_infos": []})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.csv");
        std::fs::write(&file, "x").unwrap();

        let result = sink(&server).upload_artifact(&file).await;
        assert!(matches!(result, Err(SinkError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_server_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/posts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = sink(&server).post_notification(&Notification::artifact("f")).await;
        assert!(matches!(result, Err(SinkError::Http(_))));
    }
}
