//! Wire types for the analysis proxy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::BackendError;
use crate::domain::{AnalysisResult, ImagePayload};

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Already-sanitized user text
    pub input_text: String,
    pub images: Vec<ImagePayload>,
}

/// Error body returned with a non-success status
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    /// Machine-readable category, when the proxy provides one
    #[serde(default)]
    pub code: Option<String>,
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Parse and structurally validate an analysis response body
///
/// `tasks` must be an array and `nextActionId` an integer before the body is
/// decoded into an [`AnalysisResult`].
pub fn parse_analysis(body: &str) -> Result<AnalysisResult, BackendError> {
    debug!(body_len = body.len(), "parse_analysis: called");
    let value: Value = serde_json::from_str(body.trim())?;

    if !value.get("tasks").is_some_and(Value::is_array) {
        debug!("parse_analysis: tasks is not an array");
        return Err(BackendError::InvalidStructure("tasks is not an array".to_string()));
    }

    if !value
        .get("nextActionId")
        .is_some_and(|v| v.is_i64() || v.is_u64())
    {
        debug!("parse_analysis: nextActionId is not an integer");
        return Err(BackendError::InvalidStructure(
            "nextActionId is not an integer".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| BackendError::InvalidStructure(e.to_string()))
}
