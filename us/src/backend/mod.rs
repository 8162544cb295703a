//! Analysis backend for Unscatter
//!
//! The seam between the governance layer and the network. The gateway only
//! sees [`AnalysisBackend`]; [`HttpBackend`] is the production implementation.

pub mod client;
mod error;
mod http;
mod types;

pub use client::AnalysisBackend;
pub use error::BackendError;
pub use http::HttpBackend;
pub use types::{AnalyzeRequest, ErrorBody, HealthStatus, parse_analysis};
