//! Fixed-window rate limiting keyed by caller identity.
//!
//! Each caller gets `max_requests` admissions per window. The first request
//! after a window has elapsed opens a fresh window for that caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::infrastructure::ports::{ClockPort, RateDecision, RateLimiter};

/// Configuration for rate limiter behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Admissions allowed per caller per window
    pub max_requests: u32,
    /// Length of each window
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// In-memory [`RateLimiter`] backed by a `DashMap` of per-caller windows.
///
/// The check and the increment happen under the entry's shard lock, so
/// concurrent requests from one caller never over-admit.
pub struct FixedWindowRateLimiter {
    config: RateLimitConfig,
    window: chrono::Duration,
    windows: DashMap<String, Window>,
    clock: Arc<dyn ClockPort>,
}

impl FixedWindowRateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn ClockPort>) -> Self {
        let window = chrono::Duration::from_std(config.window)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        Self {
            config,
            window,
            windows: DashMap::new(),
            clock,
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now - window.started_at < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of callers currently tracked.
    pub fn tracked_callers(&self) -> usize {
        self.windows.len()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check_and_increment(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        let mut elapsed = now - entry.started_at;
        // A clock that stepped backwards also opens a new window.
        if elapsed >= self.window || elapsed < chrono::Duration::zero() {
            *entry = Window {
                started_at: now,
                count: 0,
            };
            elapsed = chrono::Duration::zero();
        }

        if entry.count >= self.config.max_requests {
            let remaining_ms = (self.window - elapsed).num_milliseconds().max(0);
            let retry_after_secs = ((remaining_ms + 999) / 1000).max(1) as u64;
            return RateDecision::Rejected { retry_after_secs };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.config.max_requests - entry.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::MockClockPort;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().unwrap()
    }

    /// Mock clock whose reading is controlled through the returned handle.
    fn movable_clock() -> (Arc<MockClockPort>, Arc<Mutex<DateTime<Utc>>>) {
        let now = Arc::new(Mutex::new(start()));
        let reading = now.clone();
        let mut clock = MockClockPort::new();
        clock
            .expect_now()
            .returning(move || *reading.lock().unwrap());
        (Arc::new(clock), now)
    }

    fn limiter(clock: Arc<dyn ClockPort>) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(RateLimitConfig::default(), clock)
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = limiter(Arc::new(FixedClock(start())));

        for expected_remaining in (0..10).rev() {
            assert_eq!(
                limiter.check_and_increment("1.2.3.4"),
                RateDecision::Allowed {
                    remaining: expected_remaining
                }
            );
        }

        assert_eq!(
            limiter.check_and_increment("1.2.3.4"),
            RateDecision::Rejected {
                retry_after_secs: 60
            }
        );
    }

    #[test]
    fn test_callers_are_independent() {
        let limiter = limiter(Arc::new(FixedClock(start())));
        for _ in 0..10 {
            limiter.check_and_increment("a");
        }

        assert!(!limiter.check_and_increment("a").is_allowed());
        assert!(limiter.check_and_increment("b").is_allowed());
    }

    #[test]
    fn test_retry_after_rounds_up_remaining_window() {
        let (clock, now) = movable_clock();
        let limiter = limiter(clock);
        for _ in 0..10 {
            limiter.check_and_increment("a");
        }

        *now.lock().unwrap() = start() + chrono::Duration::milliseconds(58_500);
        assert_eq!(
            limiter.check_and_increment("a"),
            RateDecision::Rejected { retry_after_secs: 2 }
        );

        *now.lock().unwrap() = start() + chrono::Duration::milliseconds(59_999);
        assert_eq!(
            limiter.check_and_increment("a"),
            RateDecision::Rejected { retry_after_secs: 1 }
        );
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let (clock, now) = movable_clock();
        let limiter = limiter(clock);
        for _ in 0..10 {
            limiter.check_and_increment("a");
        }
        assert!(!limiter.check_and_increment("a").is_allowed());

        *now.lock().unwrap() = start() + chrono::Duration::seconds(60);
        assert_eq!(
            limiter.check_and_increment("a"),
            RateDecision::Allowed { remaining: 9 }
        );
    }

    #[test]
    fn test_prune_drops_only_expired_windows() {
        let (clock, now) = movable_clock();
        let limiter = limiter(clock);
        limiter.check_and_increment("old");

        *now.lock().unwrap() = start() + chrono::Duration::seconds(30);
        limiter.check_and_increment("fresh");

        *now.lock().unwrap() = start() + chrono::Duration::seconds(61);
        assert_eq!(limiter.prune_expired(), 1);
        assert_eq!(limiter.tracked_callers(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_never_over_admit() {
        let limiter = Arc::new(limiter(Arc::new(FixedClock(start()))));

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check_and_increment("same-caller") })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_allowed() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 10);
    }
}
