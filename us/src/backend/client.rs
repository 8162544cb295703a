//! AnalysisBackend trait definition

use async_trait::async_trait;

use super::{AnalyzeRequest, BackendError, HealthStatus};
use crate::domain::AnalysisResult;

/// The network side of an analysis: one request in, one task graph out
///
/// Implementations perform exactly one round-trip per call and never retry;
/// retry policy belongs to whoever calls the gateway.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit sanitized text and images for analysis
    async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalysisResult, BackendError>;

    /// Probe service availability
    async fn health(&self) -> Result<HealthStatus, BackendError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use tracing::debug;

    /// Mock backend for unit tests
    ///
    /// Replies are handed out in order; once they run out every call fails
    /// with an invalid-structure error.
    pub struct MockBackend {
        replies: Mutex<VecDeque<Result<AnalysisResult, BackendError>>>,
        requests: Mutex<Vec<AnalyzeRequest>>,
        call_count: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockBackend {
        pub fn new(replies: Vec<Result<AnalysisResult, BackendError>>) -> Self {
            debug!(reply_count = %replies.len(), "MockBackend::new: called");
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
                delay: None,
            }
        }

        /// Sleep this long before answering each call
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<AnalyzeRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalysisBackend for MockBackend {
        async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalysisResult, BackendError> {
            debug!("MockBackend::analyze: called");
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let reply = self.replies.lock().unwrap().pop_front();
            reply.unwrap_or_else(|| Err(BackendError::InvalidStructure("No more mock replies".to_string())))
        }

        async fn health(&self) -> Result<HealthStatus, BackendError> {
            Ok(HealthStatus {
                status: "ok".to_string(),
                timestamp: Utc::now(),
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn request() -> AnalyzeRequest {
            AnalyzeRequest {
                input_text: "Test".to_string(),
                images: vec![],
            }
        }

        #[tokio::test]
        async fn test_mock_backend_returns_replies_in_order() {
            let backend = MockBackend::new(vec![
                Ok(AnalysisResult {
                    tasks: vec![],
                    next_action_id: 1,
                }),
                Err(BackendError::Timeout(Duration::from_secs(1))),
            ]);

            assert_eq!(backend.analyze(request()).await.unwrap().next_action_id, 1);
            assert!(backend.analyze(request()).await.unwrap_err().is_timeout());
            assert!(backend.analyze(request()).await.is_err());

            assert_eq!(backend.call_count(), 3);
            assert_eq!(backend.requests()[0].input_text, "Test");
        }
    }
}
