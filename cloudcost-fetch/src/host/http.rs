//! HTTP client with tracing.
//!
//! Wraps `reqwest` with a shared timeout, a fixed user agent, request/response
//! tracing and JSON helpers that turn non-success statuses into errors.

use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::HttpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest body excerpt carried in a status error.
const MAX_ERROR_BODY: usize = 512;

/// User agent string for cloudcost.
const USER_AGENT: &str = concat!("cloudcost/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// Falls back to reqwest's default client if the TLS backend cannot be
    /// configured.
    pub fn with_timeout(timeout: Duration) -> Self {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });
        Self { inner }
    }

    /// Starts a request.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// Starts a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Starts a POST request.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Sends a request and returns the raw response.
    #[instrument(skip_all)]
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, HttpError> {
        let response = request.send().await?;
        debug!(url = %response.url().path(), status = %response.status(), "Response received");
        Ok(response)
    }

    /// Sends a request and fails on any non-success status.
    pub async fn send_checked(&self, request: RequestBuilder) -> Result<Response, HttpError> {
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(HttpError::Status {
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        })
    }

    /// Sends a request and decodes a JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HttpError> {
        let response = self.send_checked(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Sends a request and returns the body as text.
    pub async fn fetch_text(&self, request: RequestBuilder) -> Result<String, HttpError> {
        let response = self.send_checked(request).await?;
        Ok(response.text().await?)
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a bearer authorization header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Header name re-exported for adapters that set authorization manually.
pub const AUTHORIZATION: header::HeaderName = header::AUTHORIZATION;

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Balance {
        amount: String,
    }

    #[tokio::test]
    async fn test_fetch_json_decodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/balance"))
            .and(header_eq("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"amount":"4.20"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let request = client
            .get(&format!("{}/balance", server.uri()))
            .header(AUTHORIZATION, bearer("abc"));
        let balance: Balance = client.fetch_json(request).await.unwrap();
        assert_eq!(balance.amount, "4.20");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let err = client
            .fetch_text(client.get(&server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let result: Result<Balance, _> = client.fetch_json(client.get(&server.uri())).await;
        assert!(matches!(result, Err(HttpError::Decode(_))));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let body = "é".repeat(10);
        let cut = truncate(&body, 5);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short", 10), "short");
    }
}
