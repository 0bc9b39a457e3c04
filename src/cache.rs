// ABOUTME: Time-boxed memoization cell shared by concurrent requests
// ABOUTME: Injectable clock keeps expiry deterministic under test
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # TTL Cache
//!
//! [`TtlCell`] memoizes a single value for a fixed duration. Two
//! process-lifetime cells exist (the scope-context string and the activity
//! catalogue); both are shared across concurrent requests. Refresh races
//! are accepted: producers are idempotent, the last writer wins, and
//! staleness within the TTL window is harmless.
//!
//! A failing producer never poisons the cell — the error is returned to
//! the caller, which falls back to a degraded static value, and the next
//! caller retries the producer.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::errors::AppResult;

/// Time source injected into cache cells
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A cached value with its fetch timestamp
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

/// Single-value cache valid for a fixed duration after each refresh
pub struct TtlCell<T> {
    entry: RwLock<Option<CacheEntry<T>>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCell<T> {
    /// Create an empty cell with the given TTL and clock
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
        }
    }

    /// Return the cached value if present and not expired
    #[must_use]
    pub fn get(&self) -> Option<T> {
        let guard = self.entry.read().ok()?;
        let entry = guard.as_ref()?;
        if self.clock.now() - entry.fetched_at < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Store a value with the current timestamp, replacing any entry
    pub fn store(&self, value: T) {
        if let Ok(mut guard) = self.entry.write() {
            *guard = Some(CacheEntry {
                value,
                fetched_at: self.clock.now(),
            });
        }
    }

    /// Return the cached value, invoking `producer` on miss or expiry.
    ///
    /// The lock is never held across the producer await; concurrent
    /// refreshes may race and the last writer wins.
    ///
    /// # Errors
    ///
    /// Returns the producer's error on a failed refresh; the cell keeps
    /// whatever entry it had (possibly none).
    pub async fn get_or_refresh<F, Fut>(&self, producer: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let value = producer().await?;
        self.store(value.clone());
        Ok(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::errors::AppError;

    struct FakeClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FakeClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc::now()),
            })
        }

        fn advance(&self, seconds: i64) {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::seconds(seconds);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn refresh_on_miss_then_serves_cached() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let clock = FakeClock::new();
        let cell = TtlCell::new(Duration::from_secs(300), clock as Arc<dyn Clock>);
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let value = cell
                .get_or_refresh(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AppError>(1_u32)
                })
                .await
                .unwrap();
            assert_eq!(value, 1);
        }

        // Second call served from cache without invoking the producer
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let clock = FakeClock::new();
        let cell = TtlCell::new(Duration::from_secs(300), Arc::clone(&clock) as Arc<dyn Clock>);

        cell.store(1_u32);
        assert_eq!(cell.get(), Some(1));

        clock.advance(301);
        assert_eq!(cell.get(), None);

        let value = cell
            .get_or_refresh(|| async { Ok::<_, AppError>(2_u32) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn producer_failure_does_not_poison() {
        let clock = FakeClock::new();
        let cell: TtlCell<u32> = TtlCell::new(Duration::from_secs(300), clock);

        let result = cell
            .get_or_refresh(|| async { Err(AppError::external_service("store down")) })
            .await;
        assert!(result.is_err());
        assert_eq!(cell.get(), None);

        // Next caller retries and succeeds
        let value = cell
            .get_or_refresh(|| async { Ok::<_, AppError>(7_u32) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
