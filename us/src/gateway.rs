//! The governed analysis entry point
//!
//! [`AnalysisGateway`] puts sanitization, image validation, the client-side
//! rate limit and the result cache in front of an [`AnalysisBackend`], and
//! reduces every failure to a user-safe [`AnalyzeError`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{AnalysisBackend, AnalyzeRequest, BackendError, HealthStatus, HttpBackend};
use crate::cache::{CacheStats, ResultCache};
use crate::classify::{ErrorKind, messages};
use crate::config::Config;
use crate::domain::{AnalysisResult, ImageError, ImagePayload, ImageRules};
use crate::limiter::{LimiterStats, RateLimiter};
use crate::sanitize::Sanitizer;

/// Failures surfaced to callers of [`AnalysisGateway::analyze`]
///
/// Every `Display` string is safe to show a user as-is.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{}", messages::EMPTY_INPUT)]
    EmptyInput,

    #[error("{0}")]
    InvalidImage(#[from] ImageError),

    #[error("Rate limit exceeded. Please wait {wait} before trying again.")]
    RateLimited { wait: String, retry_after: Duration },

    #[error("{}", messages::NETWORK_FAILURE)]
    NetworkFailure,

    #[error("{}", messages::AUTH_FAILURE)]
    AuthFailure,

    #[error("{}", messages::QUOTA_EXCEEDED)]
    QuotaExceeded,

    #[error("{}", messages::INVALID_RESPONSE)]
    InvalidResponseStructure,

    #[error("{}", messages::GENERIC_FAILURE)]
    GenericFailure,
}

impl From<ErrorKind> for AnalyzeError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::EmptyInput => Self::EmptyInput,
            ErrorKind::NetworkFailure => Self::NetworkFailure,
            ErrorKind::AuthFailure => Self::AuthFailure,
            ErrorKind::QuotaExceeded => Self::QuotaExceeded,
            ErrorKind::InvalidResponse => Self::InvalidResponseStructure,
            ErrorKind::GenericFailure => Self::GenericFailure,
        }
    }
}

impl From<BackendError> for AnalyzeError {
    fn from(err: BackendError) -> Self {
        err.kind().into()
    }
}

/// Rate-limited, cached access to the analysis backend
pub struct AnalysisGateway {
    backend: Arc<dyn AnalysisBackend>,
    limiter: RateLimiter,
    cache: ResultCache,
    sanitizer: Sanitizer,
    image_rules: ImageRules,
    timeout: Duration,
}

impl AnalysisGateway {
    /// Create a gateway over any backend
    pub fn new(backend: Arc<dyn AnalysisBackend>, config: &Config) -> Self {
        debug!("AnalysisGateway::new: called");
        Self {
            backend,
            limiter: RateLimiter::new(config.rate_limit.clone()),
            cache: ResultCache::new(config.cache.clone()),
            sanitizer: Sanitizer::new(config.input.max_text_length),
            image_rules: config.images.clone(),
            timeout: config.api.timeout(),
        }
    }

    /// Create a gateway talking HTTP to the configured proxy
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let backend = HttpBackend::from_config(&config.api)?;
        info!(base_url = %backend.base_url(), "Analysis gateway ready");
        Ok(Self::new(Arc::new(backend), config))
    }

    /// Analyze free-form text and images into a task plan
    ///
    /// Input checks run before the limiter, so rejected input never costs a
    /// slot. A cache hit still does.
    pub async fn analyze(&self, text: &str, images: &[ImagePayload]) -> Result<Arc<AnalysisResult>, AnalyzeError> {
        debug!(text_len = text.len(), image_count = images.len(), "AnalysisGateway::analyze: called");

        let input_text = self.sanitizer.sanitize(text);
        if input_text.is_empty() && images.is_empty() {
            debug!("AnalysisGateway::analyze: empty input");
            return Err(AnalyzeError::EmptyInput);
        }

        self.image_rules.validate(images)?;

        if !self.limiter.can_make_request().await {
            let retry_after = self.limiter.time_until_next_request().await;
            let wait = self.limiter.wait_time_message().await;
            info!(%wait, "Analysis refused by rate limiter");
            return Err(AnalyzeError::RateLimited { wait, retry_after });
        }

        if let Some(cached) = self.cache.get(&input_text, images).await {
            info!("Returning cached analysis");
            return Ok(cached);
        }

        let request = AnalyzeRequest {
            input_text: input_text.clone(),
            images: images.to_vec(),
        };

        let result = match tokio::time::timeout(self.timeout, self.backend.analyze(request)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let kind = e.kind();
                if e.is_timeout() {
                    warn!(error = %e, "Analysis timed out in transport");
                } else {
                    warn!(error = %e, ?kind, "Analysis failed");
                }
                return Err(kind.into());
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Analysis timed out");
                return Err(AnalyzeError::NetworkFailure);
            }
        };

        if result.next_action().is_none() {
            warn!(next_action_id = result.next_action_id, "Next action does not match any task");
        }
        for (task, dependency) in result.dangling_dependencies() {
            debug!(task, dependency, "AnalysisGateway::analyze: dangling dependency");
        }

        let result = Arc::new(result);
        self.cache.set(&input_text, images, Arc::clone(&result)).await;

        info!(task_count = result.tasks.len(), "Analysis complete");
        Ok(result)
    }

    /// Probe the backend
    ///
    /// Not rate limited and never cached.
    pub async fn health(&self) -> Result<HealthStatus, AnalyzeError> {
        debug!("AnalysisGateway::health: called");
        match tokio::time::timeout(self.timeout, self.backend.health()).await {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(e)) => {
                warn!(error = %e, "Health check failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Health check timed out");
                Err(AnalyzeError::NetworkFailure)
            }
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn limiter_stats(&self) -> LimiterStats {
        self.limiter.stats().await
    }

    pub async fn clear_cache(&self) {
        debug!("AnalysisGateway::clear_cache: called");
        self.cache.clear().await;
    }

    pub async fn reset_limiter(&self) {
        debug!("AnalysisGateway::reset_limiter: called");
        self.limiter.reset().await;
    }
}
