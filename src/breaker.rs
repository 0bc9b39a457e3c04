// ABOUTME: Circuit breaker guarding calls to the LLM provider
// ABOUTME: Fails fast during cooldown and applies a per-call deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Circuit Breaker
//!
//! Wraps every provider call. After a run of consecutive failures the
//! breaker opens and rejects calls with [`BreakerError::Open`] until the
//! cooldown elapses; the conversation loop maps that to a soft
//! "temporarily unavailable" reply instead of queueing load against an
//! unhealthy backend. Each guarded call also carries a hard deadline.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::cache::Clock;
use crate::constants::breaker;
use crate::errors::{AppError, AppResult};

/// Failure surface of a guarded call
#[derive(Debug, thiserror::Error)]
pub enum BreakerError {
    /// The breaker is open; no call was attempted
    #[error("circuit breaker is open")]
    Open,
    /// The call was attempted and failed (or timed out)
    #[error(transparent)]
    Inner(#[from] AppError),
}

struct BreakerState {
    consecutive_failures: u32,
    open_until: Option<DateTime<Utc>>,
}

/// Circuit breaker with consecutive-failure tracking and cooldown
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: chrono::Duration,
    call_timeout: Duration,
    state: Mutex<BreakerState>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    /// Create a breaker with the default thresholds
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(
            breaker::FAILURE_THRESHOLD,
            Duration::from_secs(breaker::COOLDOWN_SECONDS),
            Duration::from_secs(breaker::CALL_TIMEOUT_SECONDS),
            clock,
        )
    }

    /// Create a breaker with explicit thresholds
    #[must_use]
    pub fn with_limits(
        failure_threshold: u32,
        cooldown: Duration,
        call_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            failure_threshold,
            cooldown: chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::MAX),
            call_timeout,
            state: Mutex::new(BreakerState {
                consecutive_failures: 0,
                open_until: None,
            }),
            clock,
        }
    }

    /// Run a call through the breaker.
    ///
    /// # Errors
    ///
    /// [`BreakerError::Open`] when the breaker is in cooldown;
    /// [`BreakerError::Inner`] when the call itself fails or exceeds the
    /// per-call deadline.
    pub async fn execute<T, F, Fut>(&self, call: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if self.is_open() {
            return Err(BreakerError::Open);
        }

        let outcome = tokio::time::timeout(self.call_timeout, call()).await;
        match outcome {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(err)) => {
                self.record_failure();
                Err(BreakerError::Inner(err))
            }
            Err(_elapsed) => {
                self.record_failure();
                Err(BreakerError::Inner(AppError::external_service(
                    "provider call exceeded its deadline",
                )))
            }
        }
    }

    fn is_open(&self) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        match state.open_until {
            Some(until) if self.clock.now() < until => true,
            Some(_) => {
                // Cooldown elapsed; allow a probe call through
                state.open_until = None;
                false
            }
            None => false,
        }
    }

    fn record_success(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.consecutive_failures = 0;
            state.open_until = None;
        }
    }

    fn record_failure(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.consecutive_failures += 1;
            if state.consecutive_failures >= self.failure_threshold {
                let until = self.clock.now() + self.cooldown;
                state.open_until = Some(until);
                warn!(
                    failures = state.consecutive_failures,
                    open_until = %until,
                    "circuit breaker opened"
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cache::SystemClock;

    fn breaker(threshold: u32) -> CircuitBreaker {
        CircuitBreaker::with_limits(
            threshold,
            Duration::from_secs(30),
            Duration::from_secs(5),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let breaker = breaker(2);

        for _ in 0..2 {
            let result: Result<(), _> = breaker
                .execute(|| async { Err(AppError::external_service("down")) })
                .await;
            assert!(matches!(result, Err(BreakerError::Inner(_))));
        }

        let result: Result<(), _> = breaker.execute(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(BreakerError::Open)));
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let breaker = breaker(2);

        let _: Result<(), _> = breaker
            .execute(|| async { Err(AppError::external_service("down")) })
            .await;
        let result = breaker.execute(|| async { Ok(1_u32) }).await;
        assert!(result.is_ok());

        // One more failure must not open a threshold-2 breaker after the reset
        let _: Result<(), _> = breaker
            .execute(|| async { Err(AppError::external_service("down")) })
            .await;
        let result = breaker.execute(|| async { Ok(1_u32) }).await;
        assert!(result.is_ok());
    }
}
