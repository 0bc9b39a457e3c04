// ABOUTME: Document store contract consumed by the tool executors
// ABOUTME: Read-only query functions over locations, weather, activities, and rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Document Store
//!
//! The orchestration core never talks to a concrete datastore; it consumes
//! the [`DocumentStore`] trait. Every method is a read, assumed to fail by
//! returning `Err` — the core never handles partial results.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::AppResult;
use crate::models::{
    ActivityRecord, LocationRecord, LocationTag, Season, SuitabilityRule, WeatherSnapshot,
};

/// Read-only query surface over the content backing the assistant
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up a single location by slug
    async fn location_by_slug(&self, slug: &str) -> AppResult<Option<LocationRecord>>;

    /// Full-text search over locations, capped at `limit` results.
    ///
    /// An empty query browses the catalogue in store order; the tool layer
    /// never forwards an empty query, only internal callers do.
    async fn search_locations(&self, query: &str, limit: usize) -> AppResult<Vec<LocationRecord>>;

    /// The full activity catalogue
    async fn activity_catalogue(&self) -> AppResult<Vec<ActivityRecord>>;

    /// Pre-aggregated weather snapshot for a location, if one exists
    async fn cached_weather(&self, slug: &str) -> AppResult<Option<WeatherSnapshot>>;

    /// Fresh weather fetch for a location
    async fn fresh_weather(&self, slug: &str) -> AppResult<WeatherSnapshot>;

    /// Season metadata for a country on a given date
    async fn season_for_date(&self, country: &str, date: NaiveDate) -> AppResult<Option<Season>>;

    /// Locations carrying a tag, in store order
    async fn locations_by_tag(&self, tag: LocationTag) -> AppResult<Vec<LocationRecord>>;

    /// All suitability rules
    async fn suitability_rules(&self) -> AppResult<Vec<SuitabilityRule>>;
}
