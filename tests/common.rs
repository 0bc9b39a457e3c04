// ABOUTME: Shared test utilities for the explore server integration tests
// ABOUTME: Scripted providers, limiter doubles, and request helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Shared test utilities for `veld_explore_server`

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use tower::ServiceExt;

use veld_explore_server::cache::SystemClock;
use veld_explore_server::config::ServerConfig;
use veld_explore_server::errors::{AppError, AppResult};
use veld_explore_server::limits::{RateLimitDecision, RateLimiter};
use veld_explore_server::llm::{ChatProvider, ChatRequest, ProviderTurn, ToolCall};
use veld_explore_server::models::{
    ActivityRecord, LocationRecord, LocationTag, Season, SuitabilityRule, WeatherSnapshot,
};
use veld_explore_server::resources::ServerResources;
use veld_explore_server::routes::router;
use veld_explore_server::store::memory::InMemoryStore;
use veld_explore_server::store::DocumentStore;

// ═══════════════════════════════════════════════════════════════
// Provider doubles
// ═══════════════════════════════════════════════════════════════

/// Provider replaying a fixed queue of turns
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<ProviderTurn>>,
    invocations: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<ProviderTurn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            invocations: AtomicU32::new(0),
        })
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(&self, _request: ChatRequest<'_>) -> AppResult<ProviderTurn> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::internal("provider script exhausted"))
    }
}

/// Provider that requests the same tool call on every turn, forever
pub struct RepeatingToolProvider {
    call: ToolCall,
    invocations: AtomicU32,
}

impl RepeatingToolProvider {
    pub fn new(call: ToolCall) -> Arc<Self> {
        Arc::new(Self {
            call,
            invocations: AtomicU32::new(0),
        })
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for RepeatingToolProvider {
    async fn complete(&self, _request: ChatRequest<'_>) -> AppResult<ProviderTurn> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderTurn {
            content: None,
            tool_calls: vec![self.call.clone()],
        })
    }
}

/// Provider that fails every call
pub struct FailingProvider;

#[async_trait]
impl ChatProvider for FailingProvider {
    async fn complete(&self, _request: ChatRequest<'_>) -> AppResult<ProviderTurn> {
        Err(AppError::external_service("provider is down"))
    }
}

pub fn text_turn(text: &str) -> ProviderTurn {
    ProviderTurn {
        content: Some(text.to_owned()),
        tool_calls: Vec::new(),
    }
}

pub fn tool_turn(calls: Vec<ToolCall>) -> ProviderTurn {
    ProviderTurn {
        content: None,
        tool_calls: calls,
    }
}

pub fn tool_call(name: &str, input: Value, call_id: &str) -> ToolCall {
    ToolCall {
        name: name.to_owned(),
        input,
        call_id: call_id.to_owned(),
    }
}

// ═══════════════════════════════════════════════════════════════
// Limiter doubles
// ═══════════════════════════════════════════════════════════════

/// Limiter that admits everything and counts how often it was consulted
#[derive(Default)]
pub struct RecordingLimiter {
    checks: AtomicU32,
}

impl RecordingLimiter {
    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimiter for RecordingLimiter {
    async fn check(
        &self,
        _identity: &str,
        _bucket: &str,
        _limit: u32,
        _window_seconds: u64,
    ) -> AppResult<RateLimitDecision> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(RateLimitDecision {
            allowed: true,
            reset_at: chrono::Utc::now(),
        })
    }
}

/// Limiter that rejects everything with a fixed reset horizon
pub struct DenyingLimiter {
    pub retry_in_seconds: i64,
}

#[async_trait]
impl RateLimiter for DenyingLimiter {
    async fn check(
        &self,
        _identity: &str,
        _bucket: &str,
        _limit: u32,
        _window_seconds: u64,
    ) -> AppResult<RateLimitDecision> {
        Ok(RateLimitDecision {
            allowed: false,
            reset_at: chrono::Utc::now() + Duration::seconds(self.retry_in_seconds),
        })
    }
}

// ═══════════════════════════════════════════════════════════════
// Store doubles
// ═══════════════════════════════════════════════════════════════

/// Store that delegates to the seeded dataset but fails location search,
/// for exercising degraded scope-context assembly
pub struct BrokenSearchStore {
    inner: InMemoryStore,
}

impl BrokenSearchStore {
    pub fn seeded() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryStore::seeded(),
        })
    }
}

#[async_trait]
impl DocumentStore for BrokenSearchStore {
    async fn location_by_slug(&self, slug: &str) -> AppResult<Option<LocationRecord>> {
        self.inner.location_by_slug(slug).await
    }

    async fn search_locations(
        &self,
        _query: &str,
        _limit: usize,
    ) -> AppResult<Vec<LocationRecord>> {
        Err(AppError::external_service("search backend is down"))
    }

    async fn activity_catalogue(&self) -> AppResult<Vec<ActivityRecord>> {
        self.inner.activity_catalogue().await
    }

    async fn cached_weather(&self, slug: &str) -> AppResult<Option<WeatherSnapshot>> {
        self.inner.cached_weather(slug).await
    }

    async fn fresh_weather(&self, slug: &str) -> AppResult<WeatherSnapshot> {
        self.inner.fresh_weather(slug).await
    }

    async fn season_for_date(&self, country: &str, date: NaiveDate) -> AppResult<Option<Season>> {
        self.inner.season_for_date(country, date).await
    }

    async fn locations_by_tag(&self, tag: LocationTag) -> AppResult<Vec<LocationRecord>> {
        self.inner.locations_by_tag(tag).await
    }

    async fn suitability_rules(&self) -> AppResult<Vec<SuitabilityRule>> {
        self.inner.suitability_rules().await
    }
}

/// Store that delegates to the seeded dataset but stalls weather fetches,
/// for exercising the per-tool deadline
pub struct SlowWeatherStore {
    inner: InMemoryStore,
    delay: std::time::Duration,
}

impl SlowWeatherStore {
    pub fn seeded(delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryStore::seeded(),
            delay,
        })
    }
}

#[async_trait]
impl DocumentStore for SlowWeatherStore {
    async fn location_by_slug(&self, slug: &str) -> AppResult<Option<LocationRecord>> {
        self.inner.location_by_slug(slug).await
    }

    async fn search_locations(&self, query: &str, limit: usize) -> AppResult<Vec<LocationRecord>> {
        self.inner.search_locations(query, limit).await
    }

    async fn activity_catalogue(&self) -> AppResult<Vec<ActivityRecord>> {
        self.inner.activity_catalogue().await
    }

    async fn cached_weather(&self, slug: &str) -> AppResult<Option<WeatherSnapshot>> {
        self.inner.cached_weather(slug).await
    }

    async fn fresh_weather(&self, slug: &str) -> AppResult<WeatherSnapshot> {
        tokio::time::sleep(self.delay).await;
        self.inner.fresh_weather(slug).await
    }

    async fn season_for_date(&self, country: &str, date: NaiveDate) -> AppResult<Option<Season>> {
        self.inner.season_for_date(country, date).await
    }

    async fn locations_by_tag(&self, tag: LocationTag) -> AppResult<Vec<LocationRecord>> {
        self.inner.locations_by_tag(tag).await
    }

    async fn suitability_rules(&self) -> AppResult<Vec<SuitabilityRule>> {
        self.inner.suitability_rules().await
    }
}

// ═══════════════════════════════════════════════════════════════
// Resource and request helpers
// ═══════════════════════════════════════════════════════════════

/// Resources over the seeded store with an allow-all limiter and the given
/// provider
pub fn scripted_resources(
    store: Arc<InMemoryStore>,
    provider: Arc<dyn ChatProvider>,
) -> Arc<ServerResources> {
    Arc::new(
        ServerResources::new(
            ServerConfig::for_tests(),
            store,
            Arc::new(RecordingLimiter::default()),
            Arc::new(SystemClock),
        )
        .with_provider(provider),
    )
}

/// Router over fresh resources, handing back the collaborators tests
/// assert against
pub fn scripted_app(
    provider: Arc<dyn ChatProvider>,
) -> (Router, Arc<InMemoryStore>, Arc<RecordingLimiter>) {
    let store = Arc::new(InMemoryStore::seeded());
    let limiter = Arc::new(RecordingLimiter::default());
    let resources = Arc::new(
        ServerResources::new(
            ServerConfig::for_tests(),
            store.clone(),
            limiter.clone(),
            Arc::new(SystemClock),
        )
        .with_provider(provider),
    );
    (router(resources), store, limiter)
}

/// POST /explore with an optional forwarded identity, returning status,
/// headers, and the parsed JSON body
pub async fn post_explore(
    app: Router,
    identity: Option<&str>,
    body: &Value,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/explore")
        .header("content-type", "application/json");
    if let Some(identity) = identity {
        builder = builder.header("x-forwarded-for", identity);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}
