//! Mapping of failures to user-presentable messages
//!
//! Nothing that reaches the user carries raw failure text: every failure is
//! reduced to an [`ErrorKind`], and each kind has one fixed message.

use serde::{Deserialize, Serialize};

/// User-safe messages, one per failure category
pub mod messages {
    pub const EMPTY_INPUT: &str = "Input cannot be empty. Please provide text or images.";
    pub const AUTH_FAILURE: &str = "Authentication error. Please check your API configuration.";
    pub const QUOTA_EXCEEDED: &str = "Service quota exceeded. Please try again in a few minutes.";
    pub const NETWORK_FAILURE: &str = "Network error. Please check your connection and try again.";
    pub const INVALID_RESPONSE: &str = "Invalid response received. Please try again.";
    pub const GENERIC_FAILURE: &str = "An unexpected error occurred. Please try again.";
}

/// Failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    NetworkFailure,
    AuthFailure,
    QuotaExceeded,
    InvalidResponse,
    GenericFailure,
}

/// Substring rules in priority order; the first rule with a matching token wins
const RULES: [(ErrorKind, &[&str]); 4] = [
    (
        ErrorKind::AuthFailure,
        &["api key", "unauthorized", "forbidden", "authentication"],
    ),
    (ErrorKind::QuotaExceeded, &["quota", "limit", "rate"]),
    (ErrorKind::NetworkFailure, &["network", "timeout", "fetch"]),
    (ErrorKind::InvalidResponse, &["invalid", "parse", "json"]),
];

impl ErrorKind {
    /// Classify free-form failure text
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        RULES
            .iter()
            .find(|(_, tokens)| tokens.iter().any(|t| lower.contains(t)))
            .map(|(kind, _)| *kind)
            .unwrap_or(ErrorKind::GenericFailure)
    }

    /// Classify a machine-readable error code sent by the proxy
    ///
    /// The proxy's own per-origin limit surfaces as a quota failure; the
    /// client-side limit never reaches this path.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "empty_input" => Some(Self::EmptyInput),
            "rate_limited" | "quota_exceeded" => Some(Self::QuotaExceeded),
            "network_failure" => Some(Self::NetworkFailure),
            "auth_failure" => Some(Self::AuthFailure),
            "invalid_response" => Some(Self::InvalidResponse),
            "generic_failure" => Some(Self::GenericFailure),
            _ => None,
        }
    }

    /// Classify by HTTP status where the status alone is conclusive
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 | 403 => Some(Self::AuthFailure),
            429 => Some(Self::QuotaExceeded),
            _ => None,
        }
    }

    /// The fixed message shown to users for this kind
    pub fn message(self) -> &'static str {
        match self {
            Self::EmptyInput => messages::EMPTY_INPUT,
            Self::NetworkFailure => messages::NETWORK_FAILURE,
            Self::AuthFailure => messages::AUTH_FAILURE,
            Self::QuotaExceeded => messages::QUOTA_EXCEEDED,
            Self::InvalidResponse => messages::INVALID_RESPONSE,
            Self::GenericFailure => messages::GENERIC_FAILURE,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// User-safe message for arbitrary failure text
pub fn classify(message: &str) -> &'static str {
    ErrorKind::from_message(message).message()
}
