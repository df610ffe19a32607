//! Fixed-window rate limiting for outbound commerce API calls.
//!
//! Shopify allows 40 requests per second, WooCommerce 100 requests per 15
//! minutes; each provider client owns its own limiter instance with no
//! shared state. This is a local, single-process throttle: correctness
//! assumes exactly one process drives each external integration.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

/// Shopify REST Admin API: 40 requests per second.
pub const SHOPIFY_MAX_REQUESTS: u32 = 40;
/// Shopify window length.
pub const SHOPIFY_WINDOW: Duration = Duration::from_secs(1);

/// WooCommerce REST API: 100 requests per 15 minutes.
pub const WOOCOMMERCE_MAX_REQUESTS: u32 = 100;
/// WooCommerce window length.
pub const WOOCOMMERCE_WINDOW: Duration = Duration::from_secs(15 * 60);

struct Window {
    request_count: u32,
    window_start: Instant,
}

/// Fixed-window request throttle.
///
/// [`Self::check_rate_limit`] must be awaited before every outbound request.
/// The check-and-increment runs under a mutex that is held across the
/// enforced wait, so concurrent callers collectively respect the cap instead
/// of both observing "under limit" from stale state.
pub struct FixedWindowLimiter {
    max_requests: u32,
    window_ms: Duration,
    window: Mutex<Window>,
}

impl FixedWindowLimiter {
    /// Create a limiter allowing `max_requests` per `window_ms`.
    #[must_use]
    pub fn new(max_requests: u32, window_ms: Duration) -> Self {
        Self {
            max_requests,
            window_ms,
            window: Mutex::new(Window {
                request_count: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Limiter preconfigured for the Shopify REST Admin API.
    #[must_use]
    pub fn shopify() -> Self {
        Self::new(SHOPIFY_MAX_REQUESTS, SHOPIFY_WINDOW)
    }

    /// Limiter preconfigured for the WooCommerce REST API.
    #[must_use]
    pub fn woocommerce() -> Self {
        Self::new(WOOCOMMERCE_MAX_REQUESTS, WOOCOMMERCE_WINDOW)
    }

    /// Reserve one request slot, waiting out the window when the cap is hit.
    pub async fn check_rate_limit(&self) {
        let mut window = self.window.lock().await;
        // Snapshot "now" once so a burst at the window boundary cannot
        // double-reset.
        let now = Instant::now();

        if now.duration_since(window.window_start) >= self.window_ms {
            window.request_count = 0;
            window.window_start = now;
        }

        if window.request_count >= self.max_requests {
            let wait = self.window_ms - now.duration_since(window.window_start);
            warn!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting");
            tokio::time::sleep(wait).await;
            window.request_count = 0;
            window.window_start = Instant::now();
        }

        window.request_count += 1;
    }

    /// Requests still available in the current window.
    pub async fn remaining(&self) -> u32 {
        let window = self.window.lock().await;
        if window.window_start.elapsed() >= self.window_ms {
            return self.max_requests;
        }
        self.max_requests - window.request_count
    }

    /// Time until the current window resets.
    pub async fn resets_in(&self) -> Duration {
        let window = self.window.lock().await;
        self.window_ms
            .saturating_sub(window.window_start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn allows_up_to_max_without_waiting() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.check_rate_limit().await;
        }

        // No enforced wait: paused time did not advance.
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.remaining().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_out_window_when_cap_hit() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..4 {
            limiter.check_rate_limit().await;
        }

        // The 4th call had to sleep until the window expired.
        assert!(start.elapsed() >= Duration::from_secs(1));
        // ...and counts as the first request of the fresh window.
        assert_eq!(limiter.remaining().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_lazily_after_expiry() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(1));

        limiter.check_rate_limit().await;
        limiter.check_rate_limit().await;
        tokio::time::advance(Duration::from_millis(1100)).await;

        let start = Instant::now();
        limiter.check_rate_limit().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.remaining().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_respect_cap_collectively() {
        use std::sync::Arc;

        let limiter = Arc::new(FixedWindowLimiter::new(4, Duration::from_secs(1)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.check_rate_limit().await;
            }));
        }
        for handle in handles {
            handle.await.expect("task");
        }

        // 8 requests at 4/window require at least one full window of waiting.
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn resets_in_reports_time_left() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(10));
        limiter.check_rate_limit().await;
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(limiter.resets_in().await, Duration::from_secs(6));
    }
}
