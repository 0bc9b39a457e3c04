// ABOUTME: Tool catalogue and dispatch for the assistant's four read-only tools
// ABOUTME: ToolKind enum keeps adding or removing a tool a compile-checked change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Tools
//!
//! The assistant can call exactly four read-only tools. The catalogue is
//! code-defined and never mutated at runtime; dispatch goes through
//! [`ToolKind`] with an exhaustive match rather than a string-keyed table.

pub mod execute;
pub mod inputs;

use serde_json::json;

use crate::llm::ToolDefinition;
use crate::models::LocationTag;

/// The four tools, as a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Full-text location search
    SearchLocations,
    /// Weather snapshot for one location
    GetWeather,
    /// Suitability ratings for activities at one location
    GetActivityAdvice,
    /// Locations carrying a known tag
    ListLocationsByTag,
}

impl ToolKind {
    /// Wire name of the tool
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SearchLocations => "search_locations",
            Self::GetWeather => "get_weather",
            Self::GetActivityAdvice => "get_activity_advice",
            Self::ListLocationsByTag => "list_locations_by_tag",
        }
    }

    /// Resolve a wire name to a tool, if known
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "search_locations" => Some(Self::SearchLocations),
            "get_weather" => Some(Self::GetWeather),
            "get_activity_advice" => Some(Self::GetActivityAdvice),
            "list_locations_by_tag" => Some(Self::ListLocationsByTag),
            _ => None,
        }
    }
}

/// Build the static tool catalogue offered to the provider
#[must_use]
pub fn tool_catalogue() -> Vec<ToolDefinition> {
    let tag_names: Vec<&str> = LocationTag::ALL.iter().map(|t| t.as_str()).collect();
    vec![
        ToolDefinition {
            name: ToolKind::SearchLocations.name(),
            description: "Search destinations by name or description",
            input_schema: json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: ToolKind::GetWeather.name(),
            description: "Current weather, short forecast, and season for a destination",
            input_schema: json!({
                "type": "object",
                "properties": { "location_slug": { "type": "string" } },
                "required": ["location_slug"]
            }),
        },
        ToolDefinition {
            name: ToolKind::GetActivityAdvice.name(),
            description: "Rate how suitable current weather is for activities at a destination",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "location_slug": { "type": "string" },
                    "activities": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["location_slug", "activities"]
            }),
        },
        ToolDefinition {
            name: ToolKind::ListLocationsByTag.name(),
            description: "List destinations carrying a tag",
            input_schema: json!({
                "type": "object",
                "properties": { "tag": { "type": "string", "enum": tag_names } },
                "required": ["tag"]
            }),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_four_tools_with_stable_names() {
        let catalogue = tool_catalogue();
        assert_eq!(catalogue.len(), 4);
        for definition in &catalogue {
            assert!(ToolKind::from_name(definition.name).is_some());
        }
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert_eq!(ToolKind::from_name("drop_tables"), None);
    }
}
