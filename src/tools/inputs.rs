// ABOUTME: Per-tool input validation for untrusted model-produced arguments
// ABOUTME: Extracts and type-checks every field into typed argument structs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Tool Input Validators
//!
//! Arguments arrive from the model as an untyped JSON map and are not
//! trusted. Each validator extracts and type-checks every field it needs,
//! producing a typed argument struct; the raw map never travels further
//! down the call stack. A failed validation is not an exception — it
//! becomes a structured `{error}` tool result so the model can correct
//! itself.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::constants::tools as limits;
use crate::models::LocationTag;

/// Validation failure carrying the message fed back to the model
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct InputError(pub String);

/// Validated arguments for `search_locations`
#[derive(Debug, Clone)]
pub struct SearchArgs {
    /// Non-empty, trimmed, length-capped query
    pub query: String,
}

/// Validated arguments for `get_weather`
#[derive(Debug, Clone)]
pub struct WeatherArgs {
    /// Slug-pattern-checked location identifier
    pub location_slug: String,
}

/// Validated arguments for `get_activity_advice`
#[derive(Debug, Clone)]
pub struct AdviceArgs {
    /// Slug-pattern-checked location identifier
    pub location_slug: String,
    /// Requested activity ids, strings only, fan-out capped
    pub activities: Vec<String>,
}

/// Validated arguments for `list_locations_by_tag`
#[derive(Debug, Clone)]
pub struct TagArgs {
    /// Tag from the fixed enumeration
    pub tag: LocationTag,
}

fn slug_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").ok())
        .as_ref()
}

/// Check a candidate slug against the restrictive slug grammar.
///
/// This runs before any store query so malformed or adversarial strings
/// never reach the data layer.
#[must_use]
pub fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= limits::MAX_SLUG_CHARS
        && slug_pattern().is_some_and(|p| p.is_match(candidate))
}

fn extract_slug(input: &Value) -> Result<String, InputError> {
    let slug = input
        .get("location_slug")
        .and_then(Value::as_str)
        .ok_or_else(|| InputError("location_slug must be a string".into()))?;
    if is_valid_slug(slug) {
        Ok(slug.to_owned())
    } else {
        Err(InputError(format!(
            "invalid location_slug '{slug}': lowercase letters, digits, and hyphens only"
        )))
    }
}

/// Validate `search_locations` arguments
///
/// # Errors
///
/// Returns an error when `query` is missing, not a string, or empty after
/// trimming.
pub fn validate_search(input: &Value) -> Result<SearchArgs, InputError> {
    let raw = input
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| InputError("query must be a string".into()))?;

    let query: String = raw.trim().chars().take(limits::MAX_QUERY_CHARS).collect();
    if query.is_empty() {
        return Err(InputError("missing query".into()));
    }
    Ok(SearchArgs { query })
}

/// Validate `get_weather` arguments
///
/// # Errors
///
/// Returns an error when `location_slug` is missing or not a valid slug.
pub fn validate_weather(input: &Value) -> Result<WeatherArgs, InputError> {
    Ok(WeatherArgs {
        location_slug: extract_slug(input)?,
    })
}

/// Validate `get_activity_advice` arguments
///
/// # Errors
///
/// Returns an error when the slug is invalid or `activities` is not an
/// array. Non-string array entries are filtered, not rejected.
pub fn validate_advice(input: &Value) -> Result<AdviceArgs, InputError> {
    let location_slug = extract_slug(input)?;
    let entries = input
        .get("activities")
        .and_then(Value::as_array)
        .ok_or_else(|| InputError("activities must be an array".into()))?;

    let activities: Vec<String> = entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .take(limits::MAX_ADVICE_ACTIVITIES)
        .collect();

    Ok(AdviceArgs {
        location_slug,
        activities,
    })
}

/// Validate `list_locations_by_tag` arguments
///
/// # Errors
///
/// Returns an error naming the valid tag set when `tag` is missing or not
/// part of the fixed enumeration, so the model can self-correct.
pub fn validate_tag(input: &Value) -> Result<TagArgs, InputError> {
    let raw = input
        .get("tag")
        .and_then(Value::as_str)
        .ok_or_else(|| InputError("tag must be a string".into()))?;

    LocationTag::parse(raw).map_or_else(
        || {
            let valid: Vec<&str> = LocationTag::ALL.iter().map(|t| t.as_str()).collect();
            Err(InputError(format!(
                "unknown tag '{raw}'; valid tags: {}",
                valid.join(", ")
            )))
        },
        |tag| Ok(TagArgs { tag }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slug_accepts_minimal_and_realistic_values() {
        assert!(is_valid_slug("a"));
        assert!(is_valid_slug("victoria-falls"));
        assert!(is_valid_slug("mana-pools"));
    }

    #[test]
    fn slug_rejects_uppercase_spaces_and_oversize() {
        assert!(!is_valid_slug("Harare"));
        assert!(!is_valid_slug("victoria falls"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(&"a".repeat(65)));
        assert!(!is_valid_slug("harare; drop tables"));
    }

    #[test]
    fn search_requires_non_empty_query() {
        assert!(validate_search(&json!({ "query": "   " })).is_err());
        assert!(validate_search(&json!({ "query": 42 })).is_err());
        assert!(validate_search(&json!({})).is_err());

        let args = validate_search(&json!({ "query": "  falls  " })).unwrap();
        assert_eq!(args.query, "falls");
    }

    #[test]
    fn search_caps_query_length() {
        let long = "x".repeat(500);
        let args = validate_search(&json!({ "query": long })).unwrap();
        assert_eq!(args.query.chars().count(), 200);
    }

    #[test]
    fn advice_filters_non_string_activities() {
        let args = validate_advice(&json!({
            "location_slug": "harare",
            "activities": ["hiking", 7, null, "fishing"]
        }))
        .unwrap();
        assert_eq!(args.activities, vec!["hiking", "fishing"]);
    }

    #[test]
    fn advice_caps_activity_fanout() {
        let many: Vec<String> = (0..30).map(|i| format!("activity-{i}")).collect();
        let args = validate_advice(&json!({
            "location_slug": "harare",
            "activities": many
        }))
        .unwrap();
        assert_eq!(args.activities.len(), 10);
    }

    #[test]
    fn tag_error_lists_valid_set() {
        let err = validate_tag(&json!({ "tag": "volcano" })).unwrap_err();
        assert!(err.0.contains("volcano"));
        assert!(err.0.contains("safari"));
        assert!(err.0.contains("national-park"));

        let args = validate_tag(&json!({ "tag": "waterfall" })).unwrap();
        assert_eq!(args.tag, LocationTag::Waterfall);
    }
}
