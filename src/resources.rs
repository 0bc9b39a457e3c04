// ABOUTME: Process-wide shared state injected into every request handler
// ABOUTME: Store, limiter, breaker, provider handle, and the two shared TTL cells
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Server Resources
//!
//! All state shared across requests lives in [`ServerResources`],
//! constructed once at process start and passed by `Arc` into the router.
//! Nothing in the crate relies on module-level mutable statics; tests
//! build resources with a fake clock, a scripted provider, and their own
//! store.

use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::cache::{Clock, TtlCell};
use crate::config::ServerConfig;
use crate::constants::{cache, tools};
use crate::errors::AppResult;
use crate::limits::RateLimiter;
use crate::llm::{ChatProvider, ProviderHandle};
use crate::models::ActivityRecord;
use crate::store::DocumentStore;

/// Shared state for the explore pipeline
pub struct ServerResources {
    /// Runtime configuration
    pub config: ServerConfig,
    /// Time source shared by caches, limiter, and breaker
    pub clock: Arc<dyn Clock>,
    /// Document store backing the tools
    pub store: Arc<dyn DocumentStore>,
    /// Admission rate limiter
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Circuit breaker guarding provider calls
    pub breaker: CircuitBreaker,
    /// Credential-keyed cache of the provider client
    pub provider_handle: ProviderHandle,
    /// Test seam: overrides the provider handle when set
    provider_override: Option<Arc<dyn ChatProvider>>,
    /// Deadline applied to each tool execution
    pub tool_timeout: Duration,
    /// Shared TTL cell for the system-prompt scope context
    pub scope_context: TtlCell<String>,
    /// Shared TTL cell for the activity catalogue
    pub activity_catalogue: TtlCell<Vec<ActivityRecord>>,
}

impl ServerResources {
    /// Assemble resources from their collaborators
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        rate_limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = Duration::from_secs(cache::SHARED_TTL_SECONDS);
        Self {
            config,
            clock: Arc::clone(&clock),
            store,
            rate_limiter,
            breaker: CircuitBreaker::new(Arc::clone(&clock)),
            provider_handle: ProviderHandle::new(),
            provider_override: None,
            tool_timeout: Duration::from_secs(tools::EXECUTION_TIMEOUT_SECONDS),
            scope_context: TtlCell::new(ttl, Arc::clone(&clock)),
            activity_catalogue: TtlCell::new(ttl, clock),
        }
    }

    /// Replace the provider resolution with a fixed instance (tests)
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// Shorten the per-tool deadline (tests)
    #[must_use]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Resolve the chat provider for the current credential.
    ///
    /// Returns `None` when no credential is configured; the caller maps
    /// that to the fixed "needs configuration" response.
    #[must_use]
    pub fn provider(&self) -> Option<Arc<dyn ChatProvider>> {
        if let Some(provider) = &self.provider_override {
            return Some(Arc::clone(provider));
        }
        self.provider_handle
            .get(self.config.llm_api_key.as_deref())
            .map(|provider| provider as Arc<dyn ChatProvider>)
    }

    /// Activity catalogue through the shared TTL cell
    ///
    /// # Errors
    ///
    /// Returns the store error when the cell is cold and the fetch fails.
    pub async fn catalogue(&self) -> AppResult<Vec<ActivityRecord>> {
        self.activity_catalogue
            .get_or_refresh(|| self.store.activity_catalogue())
            .await
    }
}
