//! HTTP client for the analysis proxy
//!
//! Speaks the proxy's JSON contract: `POST /api/analyze` for analysis and
//! `GET /health` for availability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info};

use super::{AnalysisBackend, AnalyzeRequest, BackendError, ErrorBody, HealthStatus, parse_analysis};
use crate::config::ApiConfig;
use crate::domain::AnalysisResult;

const ANALYZE_PATH: &str = "/api/analyze";
const HEALTH_PATH: &str = "/health";

/// Analysis proxy client
pub struct HttpBackend {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, BackendError> {
        debug!(?config, "HttpBackend::from_config: called");
        let timeout = config.timeout();
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            debug!("HttpBackend::transport_error: timed out");
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Network(e)
        }
    }

    /// Read a response body, turning non-success statuses into API errors
    async fn read_body(&self, response: Response) -> Result<String, BackendError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return Ok(body);
        }

        debug!(%status, "HttpBackend::read_body: API error");
        Err(api_error(status, &body))
    }
}

/// Build an API error from a failed response, preferring the JSON `error` field
fn api_error(status: StatusCode, body: &str) -> BackendError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => BackendError::Api {
            status: status.as_u16(),
            message: parsed.error,
            code: parsed.code,
        },
        Err(_) => BackendError::Api {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown status").to_string(),
            code: None,
        },
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalysisResult, BackendError> {
        debug!(
            text_len = request.input_text.len(),
            image_count = request.images.len(),
            "HttpBackend::analyze: called"
        );

        let response = self
            .http
            .post(self.url(ANALYZE_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = self.read_body(response).await?;
        let result = parse_analysis(&body)?;

        info!(task_count = result.tasks.len(), "Analysis received");
        Ok(result)
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        debug!("HttpBackend::health: called");
        let response = self
            .http
            .get(self.url(HEALTH_PATH))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = self.read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
