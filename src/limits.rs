// ABOUTME: Rate limiter contract for admission control plus an in-memory implementation
// ABOUTME: Fixed-window counting keyed by identity and bucket with Retry-After helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Admission Rate Limiting
//!
//! The admission gate consumes the [`RateLimiter`] contract. The bundled
//! [`FixedWindowLimiter`] counts requests per `(identity, bucket)` key in
//! fixed windows; deployments fronted by a shared limiter can swap in
//! their own implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::cache::Clock;
use crate::errors::AppResult;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// When the current window resets
    pub reset_at: DateTime<Utc>,
}

/// Admission quota contract
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one request for `identity` in `bucket` and decide admission.
    ///
    /// # Errors
    ///
    /// Returns an error when the limiter backend is unreachable.
    async fn check(
        &self,
        identity: &str,
        bucket: &str,
        limit: u32,
        window_seconds: u64,
    ) -> AppResult<RateLimitDecision>;
}

/// Seconds until `reset_at`, rounded up to whole seconds
#[must_use]
pub fn retry_after_seconds(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0);
    (millis as u64).div_ceil(1000)
}

struct WindowState {
    window_start: DateTime<Utc>,
    count: u32,
}

/// In-memory fixed-window limiter
pub struct FixedWindowLimiter {
    windows: DashMap<String, WindowState>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// Create a limiter with the given clock
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn check(
        &self,
        identity: &str,
        bucket: &str,
        limit: u32,
        window_seconds: u64,
    ) -> AppResult<RateLimitDecision> {
        let now = self.clock.now();
        let window = Duration::seconds(window_seconds as i64);
        let key = format!("{bucket}:{identity}");

        let mut state = self.windows.entry(key).or_insert_with(|| WindowState {
            window_start: now,
            count: 0,
        });

        if now - state.window_start >= window {
            state.window_start = now;
            state.count = 0;
        }

        state.count += 1;
        let allowed = state.count <= limit;
        let reset_at = state.window_start + window;

        Ok(RateLimitDecision { allowed, reset_at })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cache::SystemClock;

    #[tokio::test]
    async fn allows_up_to_limit_then_rejects() {
        let limiter = FixedWindowLimiter::new(Arc::new(SystemClock));

        for _ in 0..3 {
            let decision = limiter.check("10.0.0.1", "explore", 3, 3600).await.unwrap();
            assert!(decision.allowed);
        }
        let decision = limiter.check("10.0.0.1", "explore", 3, 3600).await.unwrap();
        assert!(!decision.allowed);

        // A different identity has its own window
        let decision = limiter.check("10.0.0.2", "explore", 3, 3600).await.unwrap();
        assert!(decision.allowed);
    }

    #[test]
    fn retry_after_rounds_up() {
        let now = Utc::now();
        assert_eq!(retry_after_seconds(now + Duration::seconds(30), now), 30);
        assert_eq!(
            retry_after_seconds(now + Duration::milliseconds(29_500), now),
            30
        );
        assert_eq!(retry_after_seconds(now - Duration::seconds(5), now), 0);
    }
}
