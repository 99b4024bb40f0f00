//! HTTP client for the session-reporting backend.
//!
//! Speaks the backend's wire format: `POST /session/start`,
//! `POST /posture/log`, `POST /session/end`.  All connection details come
//! from [`BackendConfig`]; nothing is hardcoded.  Callers that must keep a
//! session alive when the backend is down wrap this in
//! [`crate::report::SessionReporter`], which swallows errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendConfig;

// ---------------------------------------------------------------------------
// ReportError
// ---------------------------------------------------------------------------

/// Errors from backend reporting.  All non-fatal for the monitoring session.
#[derive(Debug, Error)]
pub enum ReportError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse backend response: {0}")]
    Parse(String),

    /// The backend replied with `success: false`.
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ReportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ReportError::Timeout
        } else {
            ReportError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `POST /posture/log`.
#[derive(Debug, Clone, Serialize)]
pub struct PostureLog {
    pub session_id: String,
    pub posture_status: String,
    pub left_angle: Option<f64>,
    pub right_angle: Option<f64>,
    pub total_angle: f64,
    pub issues: Vec<String>,
    pub feedback: Option<String>,
    pub was_corrected: bool,
    pub duration_seconds: u64,
}

/// Body of `POST /session/end`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub total_duration: u64,
    pub good_posture_percentage: f64,
    pub total_corrections: u64,
}

#[derive(Debug, Deserialize)]
struct StartSessionReply {
    success: bool,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlainReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// BackendClient
// ---------------------------------------------------------------------------

/// Thin typed wrapper over the backend REST API.
pub struct BackendClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Build a client from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// `POST /session/start` — returns the backend-assigned session id.
    pub async fn start_session(&self) -> Result<String, ReportError> {
        let url = format!("{}/session/start", self.config.base_url);
        let body = serde_json::json!({ "user_id": self.config.user_id });

        let response = self.client.post(&url).json(&body).send().await?;
        let reply: StartSessionReply = response
            .json()
            .await
            .map_err(|e| ReportError::Parse(e.to_string()))?;

        if !reply.success {
            return Err(ReportError::Rejected(
                reply.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        reply
            .session_id
            .ok_or_else(|| ReportError::Parse("missing session_id".into()))
    }

    /// `POST /posture/log` — one periodic posture record.
    pub async fn log_posture(&self, log: &PostureLog) -> Result<(), ReportError> {
        let url = format!("{}/posture/log", self.config.base_url);
        self.post_expecting_success(&url, log).await
    }

    /// `POST /session/end` — final session totals.
    pub async fn end_session(&self, summary: &SessionSummary) -> Result<(), ReportError> {
        let url = format!("{}/session/end", self.config.base_url);
        self.post_expecting_success(&url, summary).await
    }

    async fn post_expecting_success<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(), ReportError> {
        let response = self.client.post(url).json(body).send().await?;
        let reply: PlainReply = response
            .json()
            .await
            .map_err(|e| ReportError::Parse(e.to_string()))?;

        if !reply.success {
            return Err(ReportError::Rejected(
                reply.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
