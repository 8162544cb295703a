//! Client-side sliding-window rate limiter
//!
//! Advisory admission control in front of the analysis proxy. The proxy keeps
//! its own, coarser per-origin limit; the two are not coordinated.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Max requests admitted per window
    #[serde(rename = "max-requests", default = "default_max_requests")]
    pub max_requests: usize,

    /// Window length in milliseconds
    #[serde(rename = "window-ms", default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_max_requests() -> usize {
    10
}

fn default_window_ms() -> u64 {
    60_000
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
        }
    }
}

impl LimiterConfig {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Snapshot of limiter usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterStats {
    /// Admissions still inside the trailing window
    pub active: usize,
    pub max_requests: usize,
    pub window: Duration,
}

/// Sliding-window limiter
///
/// Pruning, the capacity check and recording happen under one lock, so
/// concurrent callers can never be admitted past `max_requests`.
pub struct RateLimiter {
    config: LimiterConfig,
    request_times: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a new limiter with the given configuration
    pub fn new(config: LimiterConfig) -> Self {
        debug!(?config, "RateLimiter::new: called");
        Self {
            config,
            request_times: Mutex::new(VecDeque::new()),
        }
    }

    /// Admit and record a request, or refuse without recording
    pub async fn can_make_request(&self) -> bool {
        let mut times = self.request_times.lock().await;
        let now = Instant::now();
        let window = self.config.window();

        while times.front().is_some_and(|t| now.duration_since(*t) >= window) {
            times.pop_front();
        }

        if times.len() >= self.config.max_requests {
            debug!(active = times.len(), "RateLimiter::can_make_request: limit reached");
            return false;
        }

        times.push_back(now);
        debug!(active = times.len(), "RateLimiter::can_make_request: admitted");
        true
    }

    /// Time until the oldest recorded request leaves the window
    ///
    /// Zero while under the limit.
    pub async fn time_until_next_request(&self) -> Duration {
        let times = self.request_times.lock().await;
        if times.len() < self.config.max_requests {
            return Duration::ZERO;
        }

        match times.front() {
            Some(oldest) => self.config.window().saturating_sub(Instant::now().duration_since(*oldest)),
            None => Duration::ZERO,
        }
    }

    /// Human-readable wait, e.g. "1 second" or "3 minutes"
    pub async fn wait_time_message(&self) -> String {
        format_wait(self.time_until_next_request().await)
    }

    /// Forget every recorded request
    pub async fn reset(&self) {
        debug!("RateLimiter::reset: called");
        self.request_times.lock().await.clear();
    }

    pub async fn stats(&self) -> LimiterStats {
        let times = self.request_times.lock().await;
        let now = Instant::now();
        let window = self.config.window();

        LimiterStats {
            active: times.iter().filter(|t| now.duration_since(**t) < window).count(),
            max_requests: self.config.max_requests,
            window,
        }
    }
}

/// Round a wait up to whole seconds below a minute, whole minutes above
pub fn format_wait(wait: Duration) -> String {
    let seconds = wait.as_millis().div_ceil(1000);
    if seconds < 60 {
        return format!("{} second{}", seconds, if seconds == 1 { "" } else { "s" });
    }

    let minutes = seconds.div_ceil(60);
    format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(max_requests: usize, window_ms: u64) -> RateLimiter {
        RateLimiter::new(LimiterConfig {
            max_requests,
            window_ms,
        })
    }

    #[test]
    fn test_default_config() {
        let config = LimiterConfig::default();
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_limit_then_refuses() {
        let limiter = limiter(2, 1000);

        let results = vec![
            limiter.can_make_request().await,
            limiter.can_make_request().await,
            limiter.can_make_request().await,
        ];
        assert_eq!(results, vec![true, true, false]);

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(limiter.can_make_request().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refusal_is_not_recorded() {
        let limiter = limiter(1, 1000);
        assert!(limiter.can_make_request().await);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(!limiter.can_make_request().await);

        // Only the first admission counts, so the window frees up at t=1000
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(limiter.can_make_request().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_until_next_request() {
        let limiter = limiter(2, 10_000);
        assert_eq!(limiter.time_until_next_request().await, Duration::ZERO);

        limiter.can_make_request().await;
        tokio::time::advance(Duration::from_millis(3000)).await;
        limiter.can_make_request().await;

        assert_eq!(limiter.time_until_next_request().await, Duration::from_millis(7000));

        tokio::time::advance(Duration::from_millis(20_000)).await;
        assert_eq!(limiter.time_until_next_request().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_time_message() {
        let limiter = limiter(1, 90_000);
        assert_eq!(limiter.wait_time_message().await, "0 seconds");

        limiter.can_make_request().await;
        assert_eq!(limiter.wait_time_message().await, "2 minutes");

        tokio::time::advance(Duration::from_millis(89_000)).await;
        assert_eq!(limiter.wait_time_message().await, "1 second");
    }

    #[test]
    fn test_format_wait() {
        assert_eq!(format_wait(Duration::ZERO), "0 seconds");
        assert_eq!(format_wait(Duration::from_millis(1)), "1 second");
        assert_eq!(format_wait(Duration::from_millis(1001)), "2 seconds");
        assert_eq!(format_wait(Duration::from_secs(59)), "59 seconds");
        assert_eq!(format_wait(Duration::from_secs(60)), "1 minute");
        assert_eq!(format_wait(Duration::from_secs(61)), "2 minutes");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_window() {
        let limiter = limiter(1, 60_000);
        assert!(limiter.can_make_request().await);
        assert!(!limiter.can_make_request().await);

        limiter.reset().await;
        assert!(limiter.can_make_request().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_counts_active_only() {
        let limiter = limiter(5, 1000);
        limiter.can_make_request().await;
        tokio::time::advance(Duration::from_millis(600)).await;
        limiter.can_make_request().await;

        assert_eq!(limiter.stats().await.active, 2);

        tokio::time::advance(Duration::from_millis(500)).await;
        let stats = limiter.stats().await;
        assert_eq!(stats.active, 1);
        assert_eq!(stats.max_requests, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_never_exceed_limit() {
        let limiter = Arc::new(limiter(5, 60_000));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.can_make_request().await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }
}
