//! Backend error types

use std::time::Duration;
use thiserror::Error;

use crate::classify::ErrorKind;

/// Errors that can occur while talking to the analysis proxy
///
/// These carry raw upstream detail and are meant for logs. Callers facing a
/// user go through [`BackendError::kind`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Invalid response structure: {0}")]
    InvalidStructure(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    /// Failure category for this error
    ///
    /// Typed information wins: transport and decoding failures are
    /// categorised by variant, proxy errors by their `code` and then by HTTP
    /// status. Only an uncoded proxy message with an inconclusive status falls
    /// back to text matching.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Network(_) | BackendError::Timeout(_) => ErrorKind::NetworkFailure,
            BackendError::Api { status, message, code } => code
                .as_deref()
                .and_then(ErrorKind::from_code)
                .or_else(|| ErrorKind::from_status(*status))
                .unwrap_or_else(|| ErrorKind::from_message(message)),
            BackendError::InvalidStructure(_) | BackendError::Json(_) => ErrorKind::InvalidResponse,
        }
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            BackendError::Timeout(_) => true,
            BackendError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}
