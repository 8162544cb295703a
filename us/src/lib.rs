//! Unscatter - client-side request governance for task analysis
//!
//! Unscatter sends a free-form brain dump (text and optional images) to an
//! analysis proxy and gets back a clustered task plan. This crate is the
//! layer in front of that proxy: it filters prompt-injection phrasing,
//! enforces a sliding-window request limit, caches recent results and turns
//! every failure into a fixed, user-safe message.
//!
//! # Modules
//!
//! - [`sanitize`] - Injection filtering and length limiting
//! - [`limiter`] - Sliding-window request limiter
//! - [`cache`] - Time-bounded result cache
//! - [`classify`] - Failure categories and user messages
//! - [`backend`] - Analysis backend trait and HTTP implementation
//! - [`gateway`] - The governed `analyze` entry point
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod backend;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod limiter;
pub mod render;
pub mod repl;
pub mod sanitize;

// Re-export commonly used types
pub use backend::{AnalysisBackend, AnalyzeRequest, BackendError, HealthStatus, HttpBackend};
pub use cache::{CacheConfig, CacheStats, KeyStrategy, ResultCache};
pub use classify::{ErrorKind, classify};
pub use config::{ApiConfig, Config, InputConfig};
pub use domain::{AnalysisResult, Effort, ImageError, ImagePayload, ImageRules, Impact, Level, Task, load_image};
pub use gateway::{AnalysisGateway, AnalyzeError};
pub use limiter::{LimiterConfig, LimiterStats, RateLimiter, format_wait};
pub use sanitize::{REDACTION_MARKER, Sanitizer, sanitize};
