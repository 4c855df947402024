//! HTTP client for the document service.
//!
//! Credentials are handed in explicitly; the client never reads a token from
//! shared storage. See [`crate::config::EditorConfig`] for the environment
//! variables the binary uses to build one.

use std::time::Duration;

use async_trait::async_trait;
use draftdesk_core::*;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::service::DocumentService;

/// Default URL for local development.
pub const DEFAULT_URL: &str = "http://localhost:8000/api";

/// HTTP client errors.
///
/// Every variant except `Http` carries the `detail` field of the service's
/// failure payload when one was sent.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {}", detail_or_empty(.0))]
    NotFound(Option<String>),

    #[error("Bad request: {}", detail_or_empty(.0))]
    BadRequest(Option<String>),

    #[error("Unauthorized: session token missing or rejected")]
    Unauthorized(Option<String>),

    #[error("Server error: {}: {}", .status, detail_or_empty(.detail))]
    Server {
        status: StatusCode,
        detail: Option<String>,
    },
}

fn detail_or_empty(detail: &Option<String>) -> &str {
    detail.as_deref().unwrap_or("")
}

impl ClientError {
    /// The `detail` reported by the service, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http(_) => None,
            Self::NotFound(detail) | Self::BadRequest(detail) | Self::Unauthorized(detail) => {
                detail.as_deref()
            }
            Self::Server { detail, .. } => detail.as_deref(),
        }
    }

    /// Transport-level failure (connection refused, timeout, malformed body).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Session credentials attached to every request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// HTTP client for the document service.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    base_url: String,
    credentials: Credentials,
    client: Client,
}

impl DocumentClient {
    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self::with_http_client(base_url, credentials, Client::new())
    }

    /// Create with a per-request timeout enforced by the transport.
    pub fn with_timeout(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(base_url, credentials, client))
    }

    fn with_http_client(
        base_url: impl Into<String>,
        credentials: Credentials,
        client: Client,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(token) = self.credentials.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Handle a response whose body is an acknowledgement we don't inspect.
    async fn handle_ack(&self, response: reqwest::Response) -> Result<(), ClientError> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = parse_detail(&body);
        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(detail),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::BadRequest(detail)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(detail),
            _ => ClientError::Server { status, detail },
        })
    }

    // ============================================================
    // Project Operations
    // ============================================================

    /// Get the full project snapshot.
    pub async fn get_project(&self, id: ProjectId) -> Result<Project, ClientError> {
        tracing::debug!(project = %id, "GET project");
        let response = self
            .request(reqwest::Method::GET, &format!("/projects/{}", id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Section Operations
    // ============================================================

    /// Ask the service to rewrite a section according to an instruction.
    pub async fn refine_section(
        &self,
        project_id: ProjectId,
        section_id: SectionId,
        input: &RefineInput,
    ) -> Result<(), ClientError> {
        tracing::debug!(project = %project_id, section = %section_id, "POST refine");
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/projects/{}/sections/{}/refine", project_id, section_id),
            )
            .json(input)
            .send()
            .await?;
        self.handle_ack(response).await
    }

    /// Record a like or dislike, with an optional comment.
    pub async fn submit_feedback(
        &self,
        project_id: ProjectId,
        section_id: SectionId,
        input: &FeedbackInput,
    ) -> Result<(), ClientError> {
        tracing::debug!(
            project = %project_id,
            section = %section_id,
            action = %input.action,
            "POST feedback"
        );
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/projects/{}/sections/{}/feedback", project_id, section_id),
            )
            .json(input)
            .send()
            .await?;
        self.handle_ack(response).await
    }

    // ============================================================
    // Export Operations
    // ============================================================

    /// Download the rendered document as raw bytes.
    pub async fn export_project(
        &self,
        project_id: ProjectId,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(project = %project_id, %format, "GET export");
        let response = self
            .request(reqwest::Method::GET, &format!("/export/{}", project_id))
            .query(&[("format", format.as_str())])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DocumentService for DocumentClient {
    async fn load_project(&self, id: ProjectId) -> Result<Project, ClientError> {
        self.get_project(id).await
    }

    async fn refine_section(
        &self,
        project_id: ProjectId,
        section_id: SectionId,
        input: &RefineInput,
    ) -> Result<(), ClientError> {
        DocumentClient::refine_section(self, project_id, section_id, input).await
    }

    async fn submit_feedback(
        &self,
        project_id: ProjectId,
        section_id: SectionId,
        input: &FeedbackInput,
    ) -> Result<(), ClientError> {
        DocumentClient::submit_feedback(self, project_id, section_id, input).await
    }

    async fn export_project(
        &self,
        project_id: ProjectId,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        DocumentClient::export_project(self, project_id, format).await
    }
}

/// Pull the `detail` field out of an error body.
///
/// Validation failures send a list of problems rather than a string; those are
/// rendered as compact JSON.
fn parse_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
