//! Sliding-window rate limiter shared by every outbound generation call.
//!
//! Holds the timestamps of recent calls. `acquire` purges entries older than the
//! window, waits for the oldest survivor to age out when the window is full, then
//! records the release time. The window is guarded by an async mutex held across
//! the wait, so concurrent callers queue in FIFO order instead of racing.

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

/// Free-tier quota: 2 requests per rolling minute.
pub const DEFAULT_MAX_REQUESTS: usize = 2;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

const JITTER_MIN_SECS: f64 = 0.1;
const JITTER_MAX_SECS: f64 = 2.0;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    jitter: (f64, f64),
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            jitter: (JITTER_MIN_SECS, JITTER_MAX_SECS),
            requests: Mutex::new(VecDeque::with_capacity(max_requests.max(1) + 1)),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits until one more call fits in the window, then records it.
    pub async fn acquire(&self) {
        let mut requests = self.requests.lock().await;

        let now = Instant::now();
        while let Some(&oldest) = requests.front() {
            if now.duration_since(oldest) >= self.window {
                requests.pop_front();
            } else {
                break;
            }
        }

        if requests.len() >= self.max_requests {
            if let Some(&oldest) = requests.front() {
                let wait = (oldest + self.window).saturating_duration_since(now);
                if !wait.is_zero() {
                    let total = wait + self.sample_jitter();
                    info!("Rate limit reached. Waiting {:.2} seconds...", total.as_secs_f64());
                    tokio::time::sleep(total).await;
                }
            }
        }

        // Record the release time, not the arrival time: the call happens now.
        requests.push_back(Instant::now());
    }

    fn sample_jitter(&self) -> Duration {
        let (min, max) = self.jitter;
        if max <= min {
            return Duration::from_secs_f64(min.max(0.0));
        }
        Duration::from_secs_f64(rand::rng().random_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_calls_under_quota_do_not_wait() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_call_waits_for_window_plus_jitter() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(60_099), "waited {waited:?}");
        assert!(waited <= Duration::from_millis(62_010), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_window_ever_holds_more_than_max_requests() {
        let window = Duration::from_secs(60);
        let limiter = RateLimiter::new(2, window);
        let mut released = Vec::new();

        for i in 0..9 {
            if i % 3 == 0 {
                tokio::time::advance(Duration::from_secs(7)).await;
            }
            limiter.acquire().await;
            released.push(Instant::now());
        }

        // Any three consecutive releases must span at least one full window.
        for triple in released.windows(3) {
            assert!(
                triple[2].duration_since(triple[0]) >= window,
                "three calls within {:?}",
                triple[2].duration_since(triple[0])
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_older_than_window_are_purged() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        limiter.acquire().await;
        limiter.acquire().await;

        tokio::time::advance(Duration::from_secs(60)).await;
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_window() {
        let window = Duration::from_secs(60);
        let limiter = Arc::new(RateLimiter::new(2, window));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut released = Vec::new();
        for handle in handles {
            released.push(handle.await.unwrap());
        }
        released.sort();

        assert_eq!(released[0], start);
        assert_eq!(released[1], start);
        assert!(released[2].duration_since(start) >= window);
        assert!(released[3].duration_since(start) >= window);
    }

    #[test]
    fn test_zero_max_requests_is_clamped_to_one() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.max_requests(), 1);
    }
}
