// ABOUTME: Tool executors with per-request caching, references, and timeouts
// ABOUTME: Every executor is bounded by a deadline and degrades to structured errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Tool Execution
//!
//! One [`RequestScope`] exists per inbound request. It owns the
//! request-scoped weather cache, the once-per-request rules cell, and the
//! reference sink; none of it is shared across requests. Executors run
//! sequentially today, but the weather cache is a concurrent map so the
//! batch can be parallelized later without reworking the scope.
//!
//! Every execution is wrapped in a deadline. A timed-out future is
//! dropped — its result, if any, is discarded — and the model receives a
//! tool-name-tagged error result instead. One failing tool never aborts
//! the other tools in the same turn nor the request.

use std::sync::Mutex;

use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::warn;

use crate::constants::tools as limits;
use crate::errors::AppResult;
use crate::llm::{ToolCall, ToolResultMessage};
use crate::models::{Reference, ReferenceKind, SuitabilityRule, WeatherSnapshot};
use crate::resources::ServerResources;
use crate::tools::inputs::{self, AdviceArgs, SearchArgs, TagArgs, WeatherArgs};
use crate::tools::ToolKind;

/// State owned by a single request's execution
pub struct RequestScope {
    /// Weather snapshots fetched during this request, keyed by slug
    weather_results: DashMap<String, WeatherSnapshot>,
    /// Suitability rules, fetched at most once per request
    rules: OnceCell<Vec<SuitabilityRule>>,
    /// References emitted by executors, in execution order
    references: Mutex<Vec<Reference>>,
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestScope {
    /// Create an empty scope
    #[must_use]
    pub fn new() -> Self {
        Self {
            weather_results: DashMap::new(),
            rules: OnceCell::new(),
            references: Mutex::new(Vec::new()),
        }
    }

    /// Record a reference emitted during tool execution
    pub fn push_reference(&self, reference: Reference) {
        if let Ok(mut references) = self.references.lock() {
            references.push(reference);
        }
    }

    /// Snapshot of the references emitted so far
    #[must_use]
    pub fn references(&self) -> Vec<Reference> {
        self.references
            .lock()
            .map(|references| references.clone())
            .unwrap_or_default()
    }

    /// Weather for a slug, preferring (in order) the per-request cache,
    /// the upstream pre-aggregated entry, then a fresh fetch
    async fn weather_for(
        &self,
        resources: &ServerResources,
        slug: &str,
    ) -> AppResult<WeatherSnapshot> {
        if let Some(snapshot) = self.weather_results.get(slug) {
            return Ok(snapshot.clone());
        }

        let snapshot = match resources.store.cached_weather(slug).await? {
            Some(snapshot) => snapshot,
            None => resources.store.fresh_weather(slug).await?,
        };
        self.weather_results
            .insert(slug.to_owned(), snapshot.clone());
        Ok(snapshot)
    }

    /// Suitability rules, fetched at most once for this request
    async fn rules(&self, resources: &ServerResources) -> AppResult<&[SuitabilityRule]> {
        let rules = self
            .rules
            .get_or_try_init(|| resources.store.suitability_rules())
            .await?;
        Ok(rules)
    }
}

/// Validate, execute, and package one tool call.
///
/// Never fails the request: validation failures, execution errors, and
/// timeouts all become structured `{error}` payloads the model can react
/// to.
pub async fn run_tool(
    resources: &ServerResources,
    scope: &RequestScope,
    call: &ToolCall,
) -> ToolResultMessage {
    let payload = match ToolKind::from_name(&call.name) {
        Some(kind) => dispatch(resources, scope, kind, &call.input).await,
        None => json!({ "error": format!("unknown tool '{}'", call.name) }),
    };

    ToolResultMessage {
        call_id: call.call_id.clone(),
        payload,
    }
}

async fn dispatch(
    resources: &ServerResources,
    scope: &RequestScope,
    kind: ToolKind,
    input: &Value,
) -> Value {
    match kind {
        ToolKind::SearchLocations => match inputs::validate_search(input) {
            Ok(args) => bounded(resources, scope, kind, ExecutorArgs::Search(args)).await,
            Err(err) => json!({ "error": err.to_string() }),
        },
        ToolKind::GetWeather => match inputs::validate_weather(input) {
            Ok(args) => bounded(resources, scope, kind, ExecutorArgs::Weather(args)).await,
            Err(err) => json!({ "error": err.to_string() }),
        },
        ToolKind::GetActivityAdvice => match inputs::validate_advice(input) {
            Ok(args) => bounded(resources, scope, kind, ExecutorArgs::Advice(args)).await,
            Err(err) => json!({ "error": err.to_string() }),
        },
        ToolKind::ListLocationsByTag => match inputs::validate_tag(input) {
            Ok(args) => bounded(resources, scope, kind, ExecutorArgs::Tag(args)).await,
            Err(err) => json!({ "error": err.to_string() }),
        },
    }
}

enum ExecutorArgs {
    Search(SearchArgs),
    Weather(WeatherArgs),
    Advice(AdviceArgs),
    Tag(TagArgs),
}

/// Run one executor under the tool deadline
async fn bounded(
    resources: &ServerResources,
    scope: &RequestScope,
    kind: ToolKind,
    args: ExecutorArgs,
) -> Value {
    let slug = match &args {
        ExecutorArgs::Weather(args) => Some(args.location_slug.clone()),
        ExecutorArgs::Advice(args) => Some(args.location_slug.clone()),
        ExecutorArgs::Search(_) | ExecutorArgs::Tag(_) => None,
    };

    let execution = async {
        match args {
            ExecutorArgs::Search(args) => search_locations(resources, scope, &args).await,
            ExecutorArgs::Weather(args) => get_weather(resources, scope, &args).await,
            ExecutorArgs::Advice(args) => activity_advice(resources, scope, &args).await,
            ExecutorArgs::Tag(args) => list_by_tag(resources, scope, &args).await,
        }
    };

    match tokio::time::timeout(resources.tool_timeout, execution).await {
        Ok(Ok(payload)) => payload,
        Ok(Err(err)) => {
            warn!(
                tool = kind.name(),
                slug = slug.as_deref(),
                error = %err,
                "tool execution failed"
            );
            json!({ "error": format!("{} failed: {err}", kind.name()) })
        }
        Err(_elapsed) => {
            warn!(
                tool = kind.name(),
                slug = slug.as_deref(),
                "tool execution timed out"
            );
            json!({ "error": format!("{} timed out", kind.name()) })
        }
    }
}

async fn search_locations(
    resources: &ServerResources,
    scope: &RequestScope,
    args: &SearchArgs,
) -> AppResult<Value> {
    let results = resources
        .store
        .search_locations(&args.query, limits::MAX_SEARCH_RESULTS)
        .await?;

    for location in &results {
        scope.push_reference(Reference {
            slug: location.slug.clone(),
            name: location.name.clone(),
            kind: ReferenceKind::Location,
        });
    }

    let locations: Vec<Value> = results
        .iter()
        .map(|l| json!({ "slug": l.slug, "name": l.name, "summary": l.summary }))
        .collect();

    Ok(json!({ "query": args.query, "locations": locations }))
}

async fn get_weather(
    resources: &ServerResources,
    scope: &RequestScope,
    args: &WeatherArgs,
) -> AppResult<Value> {
    let slug = &args.location_slug;
    let Some(location) = resources.store.location_by_slug(slug).await? else {
        return Ok(json!({ "error": format!("no location found for slug '{slug}'") }));
    };

    let snapshot = scope.weather_for(resources, slug).await?;

    let today = resources.clock.now().date_naive();
    let season = resources
        .store
        .season_for_date(&location.country, today)
        .await?;

    scope.push_reference(Reference {
        slug: location.slug.clone(),
        name: location.name.clone(),
        kind: ReferenceKind::Weather,
    });

    Ok(json!({
        "location": location.name,
        "conditions": snapshot.conditions,
        "temperature_c": snapshot.temperature_c,
        "forecast": snapshot.forecast,
        "season": season,
    }))
}

async fn activity_advice(
    resources: &ServerResources,
    scope: &RequestScope,
    args: &AdviceArgs,
) -> AppResult<Value> {
    let slug = &args.location_slug;
    let Some(location) = resources.store.location_by_slug(slug).await? else {
        return Ok(json!({ "error": format!("no location found for slug '{slug}'") }));
    };

    let catalogue = resources.catalogue().await?;
    let matched: Vec<_> = catalogue
        .iter()
        .filter(|activity| args.activities.iter().any(|id| id == &activity.id))
        .collect();

    if matched.is_empty() {
        let sample: Vec<&str> = catalogue
            .iter()
            .take(limits::ACTIVITY_ID_SAMPLE)
            .map(|a| a.id.as_str())
            .collect();
        return Ok(json!({
            "error": "none of the requested activity ids are known",
            "valid_ids_sample": sample,
        }));
    }

    let snapshot = scope.weather_for(resources, slug).await?;

    let ratings: Vec<Value> = match &snapshot.insights {
        Some(insights) => {
            let rules = scope.rules(resources).await?;
            matched
                .iter()
                .filter_map(|activity| {
                    let rule = rules
                        .iter()
                        .find(|r| r.activity_id.as_deref() == Some(activity.id.as_str()))
                        .or_else(|| {
                            rules
                                .iter()
                                .find(|r| r.category.as_deref() == Some(activity.category.as_str()))
                        })?;
                    let rating = rule.evaluate(&activity.label, insights);
                    serde_json::to_value(rating).ok()
                })
                .collect()
        }
        None => Vec::new(),
    };

    scope.push_reference(Reference {
        slug: location.slug.clone(),
        name: location.name.clone(),
        kind: ReferenceKind::Location,
    });
    for activity in &matched {
        scope.push_reference(Reference {
            slug: activity.id.clone(),
            name: activity.label.clone(),
            kind: ReferenceKind::Activity,
        });
    }

    Ok(json!({
        "location": location.name,
        "conditions": snapshot.conditions,
        "ratings": ratings,
    }))
}

async fn list_by_tag(
    resources: &ServerResources,
    scope: &RequestScope,
    args: &TagArgs,
) -> AppResult<Value> {
    let all = resources.store.locations_by_tag(args.tag).await?;
    let total = all.len();
    let shown: Vec<_> = all.into_iter().take(limits::MAX_TAG_RESULTS).collect();

    for location in &shown {
        scope.push_reference(Reference {
            slug: location.slug.clone(),
            name: location.name.clone(),
            kind: ReferenceKind::Location,
        });
    }

    let locations: Vec<Value> = shown
        .iter()
        .map(|l| json!({ "slug": l.slug, "name": l.name, "summary": l.summary }))
        .collect();

    Ok(json!({
        "tag": args.tag.as_str(),
        "total": total,
        "shown": locations.len(),
        "locations": locations,
    }))
}
