// ABOUTME: Core data models for chat, locations, weather, and activity advice
// ABOUTME: Serde DTOs plus the suitability rule evaluation used by the advice tool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! Common data structures shared by the store, the tool layer, and the
//! explore route.

use serde::{Deserialize, Serialize};

// ============================================================================
// Chat
// ============================================================================

/// Role of a transcript entry supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// End-user turn
    User,
    /// Assistant turn
    Assistant,
}

/// One entry in the running conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the entry
    pub role: ChatRole,
    /// Text content, length-capped at admission
    pub content: String,
}

// ============================================================================
// References
// ============================================================================

/// Kind of entity surfaced as a citation in the final payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// A place record
    Location,
    /// A weather snapshot for a place
    Weather,
    /// An activity from the catalogue
    Activity,
}

/// Linkable citation attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Slug of the referenced entity
    pub slug: String,
    /// Display name
    pub name: String,
    /// Entity kind; at most one reference per slug survives deduplication,
    /// preferring `Location`
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
}

// ============================================================================
// Locations
// ============================================================================

/// Fixed set of tags a location can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationTag {
    /// Big-game viewing areas
    Safari,
    /// Waterfalls
    Waterfall,
    /// Cities and towns
    City,
    /// Lakes and dams
    Lake,
    /// Mountain ranges and highlands
    Mountains,
    /// Gazetted national parks
    NationalPark,
    /// Archaeological and historical sites
    Ruins,
}

impl LocationTag {
    /// Every known tag, in catalogue order
    pub const ALL: [Self; 7] = [
        Self::Safari,
        Self::Waterfall,
        Self::City,
        Self::Lake,
        Self::Mountains,
        Self::NationalPark,
        Self::Ruins,
    ];

    /// Kebab-case wire name of the tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safari => "safari",
            Self::Waterfall => "waterfall",
            Self::City => "city",
            Self::Lake => "lake",
            Self::Mountains => "mountains",
            Self::NationalPark => "national-park",
            Self::Ruins => "ruins",
        }
    }

    /// Parse a wire name into a tag
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == value)
    }
}

/// A place the assistant can talk about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    /// URL-safe identifier, unique across the store
    pub slug: String,
    /// Display name
    pub name: String,
    /// ISO country code of the location
    pub country: String,
    /// Short description shown to the model
    pub summary: String,
    /// Tags used by the tag listing tool
    pub tags: Vec<LocationTag>,
}

// ============================================================================
// Weather
// ============================================================================

/// One day of the short forecast attached to a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Forecast date (ISO 8601 date)
    pub date: String,
    /// One-line summary of the day
    pub summary: String,
    /// Expected daily high in Celsius
    pub high_c: f64,
    /// Expected daily low in Celsius
    pub low_c: f64,
}

/// Precomputed numeric insights used by suitability rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherInsights {
    /// Current temperature in Celsius
    pub temperature_c: f64,
    /// Sustained wind in km/h
    pub wind_kph: f64,
    /// Precipitation over the last 24h in millimetres
    pub precipitation_mm: f64,
    /// Relative humidity percentage
    pub humidity_pct: f64,
    /// UV index
    pub uv_index: f64,
}

/// Current conditions plus a short forecast for one location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Human-readable description of current conditions
    pub conditions: String,
    /// Current temperature in Celsius
    pub temperature_c: f64,
    /// Short daily forecast
    pub forecast: Vec<DailyForecast>,
    /// Numeric insights when the upstream aggregation produced them
    pub insights: Option<WeatherInsights>,
}

/// Season metadata resolved for a country and date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    /// Season name (e.g. "dry season")
    pub name: String,
    /// Short description of what the season means for travellers
    pub description: String,
}

// ============================================================================
// Activities and suitability
// ============================================================================

/// One activity from the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Stable identifier matched against advice requests
    pub id: String,
    /// Display label
    pub label: String,
    /// Category used for rule fallback (e.g. "outdoor", "water")
    pub category: String,
    /// Short description
    pub description: String,
}

/// Suitability verdict levels, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuitabilityLevel {
    /// Conditions are within the ideal band
    Good,
    /// Conditions are acceptable but not ideal
    Fair,
    /// Conditions fall outside the acceptable band
    Poor,
}

/// Weather metric a suitability rule evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMetric {
    /// Current temperature in Celsius
    TemperatureC,
    /// Sustained wind in km/h
    WindKph,
    /// Precipitation over the last 24h in millimetres
    PrecipitationMm,
    /// UV index
    UvIndex,
}

impl RuleMetric {
    /// Extract the metric value from a set of insights
    #[must_use]
    pub const fn extract(self, insights: &WeatherInsights) -> f64 {
        match self {
            Self::TemperatureC => insights.temperature_c,
            Self::WindKph => insights.wind_kph,
            Self::PrecipitationMm => insights.precipitation_mm,
            Self::UvIndex => insights.uv_index,
        }
    }
}

/// Rule mapping weather insights to a suitability verdict for one
/// activity (preferred) or a whole category (fallback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuitabilityRule {
    /// Rule identifier
    pub id: String,
    /// Activity this rule binds to; activity rules beat category rules
    pub activity_id: Option<String>,
    /// Category this rule binds to when no activity rule matches
    pub category: Option<String>,
    /// Metric the rule inspects
    pub metric: RuleMetric,
    /// Lower bound of the ideal band
    pub ideal_min: f64,
    /// Upper bound of the ideal band
    pub ideal_max: f64,
    /// Lower bound of the acceptable band
    pub acceptable_min: f64,
    /// Upper bound of the acceptable band
    pub acceptable_max: f64,
}

impl SuitabilityRule {
    /// Evaluate the rule against a set of weather insights.
    ///
    /// The rating deliberately narrows what the model can repeat: it gets
    /// a verdict and one metric value, not the raw insight payload.
    #[must_use]
    pub fn evaluate(&self, activity_label: &str, insights: &WeatherInsights) -> SuitabilityRating {
        let value = self.metric.extract(insights);

        let level = if (self.ideal_min..=self.ideal_max).contains(&value) {
            SuitabilityLevel::Good
        } else if (self.acceptable_min..=self.acceptable_max).contains(&value) {
            SuitabilityLevel::Fair
        } else {
            SuitabilityLevel::Poor
        };

        let detail = match level {
            SuitabilityLevel::Good => format!("Conditions look good for {activity_label}."),
            SuitabilityLevel::Fair => {
                format!("Conditions are workable for {activity_label}, with some compromise.")
            }
            SuitabilityLevel::Poor => {
                format!("Current conditions are not favourable for {activity_label}.")
            }
        };

        SuitabilityRating {
            level,
            label: activity_label.to_owned(),
            detail,
            metric: Some(value),
        }
    }
}

/// Structured verdict returned by the activity advice tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuitabilityRating {
    /// Verdict level
    pub level: SuitabilityLevel,
    /// Activity label the verdict applies to
    pub label: String,
    /// Short explanation safe to repeat verbatim
    pub detail: String,
    /// Metric value the verdict was derived from, when available
    pub metric: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn insights(temperature_c: f64) -> WeatherInsights {
        WeatherInsights {
            temperature_c,
            wind_kph: 10.0,
            precipitation_mm: 0.0,
            humidity_pct: 40.0,
            uv_index: 6.0,
        }
    }

    fn rule() -> SuitabilityRule {
        SuitabilityRule {
            id: "hiking-temp".into(),
            activity_id: Some("hiking".into()),
            category: None,
            metric: RuleMetric::TemperatureC,
            ideal_min: 12.0,
            ideal_max: 26.0,
            acceptable_min: 5.0,
            acceptable_max: 32.0,
        }
    }

    #[test]
    fn rule_levels_follow_bands() {
        let r = rule();
        assert_eq!(r.evaluate("Hiking", &insights(20.0)).level, SuitabilityLevel::Good);
        assert_eq!(r.evaluate("Hiking", &insights(30.0)).level, SuitabilityLevel::Fair);
        assert_eq!(r.evaluate("Hiking", &insights(40.0)).level, SuitabilityLevel::Poor);
    }

    #[test]
    fn rating_carries_metric_value() {
        let rating = rule().evaluate("Hiking", &insights(20.0));
        assert_eq!(rating.metric, Some(20.0));
    }

    #[test]
    fn tag_parse_round_trips() {
        for tag in LocationTag::ALL {
            assert_eq!(LocationTag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(LocationTag::parse("volcano"), None);
    }
}
