// ABOUTME: Seeded in-memory document store used by the binary and the test suite
// ABOUTME: Tracks fetch counters so tests can assert per-request caching behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! In-memory [`DocumentStore`] with a small seeded dataset of southern
//! African destinations. The counters exist so integration tests can
//! assert that the request-scoped caches actually prevent refetches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::constants::locale::DEFAULT_COUNTRY;
use crate::errors::AppResult;
use crate::models::{
    ActivityRecord, DailyForecast, LocationRecord, LocationTag, RuleMetric, Season,
    SuitabilityRule, WeatherInsights, WeatherSnapshot,
};
use crate::store::DocumentStore;

/// Seeded in-memory store
pub struct InMemoryStore {
    locations: Vec<LocationRecord>,
    activities: Vec<ActivityRecord>,
    rules: Vec<SuitabilityRule>,
    weather: HashMap<String, WeatherSnapshot>,
    fresh_weather_calls: AtomicU32,
    rules_calls: AtomicU32,
}

impl InMemoryStore {
    /// Build a store with the demo dataset
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            locations: seed_locations(),
            activities: seed_activities(),
            rules: seed_rules(),
            weather: seed_weather(),
            fresh_weather_calls: AtomicU32::new(0),
            rules_calls: AtomicU32::new(0),
        }
    }

    /// Number of fresh weather fetches issued so far
    #[must_use]
    pub fn fresh_weather_calls(&self) -> u32 {
        self.fresh_weather_calls.load(Ordering::SeqCst)
    }

    /// Number of suitability rule fetches issued so far
    #[must_use]
    pub fn rules_calls(&self) -> u32 {
        self.rules_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn location_by_slug(&self, slug: &str) -> AppResult<Option<LocationRecord>> {
        Ok(self.locations.iter().find(|l| l.slug == slug).cloned())
    }

    async fn search_locations(&self, query: &str, limit: usize) -> AppResult<Vec<LocationRecord>> {
        let needle = query.to_lowercase();
        Ok(self
            .locations
            .iter()
            .filter(|l| {
                needle.is_empty()
                    || l.name.to_lowercase().contains(&needle)
                    || l.summary.to_lowercase().contains(&needle)
                    || l.slug.contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn activity_catalogue(&self) -> AppResult<Vec<ActivityRecord>> {
        Ok(self.activities.clone())
    }

    async fn cached_weather(&self, slug: &str) -> AppResult<Option<WeatherSnapshot>> {
        // Only the busiest destinations have a pre-aggregated entry
        if matches!(slug, "harare" | "victoria-falls") {
            Ok(self.weather.get(slug).cloned())
        } else {
            Ok(None)
        }
    }

    async fn fresh_weather(&self, slug: &str) -> AppResult<WeatherSnapshot> {
        self.fresh_weather_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .weather
            .get(slug)
            .cloned()
            .unwrap_or_else(default_snapshot))
    }

    async fn season_for_date(&self, country: &str, date: NaiveDate) -> AppResult<Option<Season>> {
        if country != DEFAULT_COUNTRY {
            return Ok(None);
        }
        // Southern hemisphere split: dry season May-October, wet otherwise
        let season = if (5..=10).contains(&date.month()) {
            Season {
                name: "dry season".into(),
                description: "Clear skies and cool mornings; peak game viewing.".into(),
            }
        } else {
            Season {
                name: "wet season".into(),
                description: "Afternoon storms and lush landscapes; rivers run high.".into(),
            }
        };
        Ok(Some(season))
    }

    async fn locations_by_tag(&self, tag: LocationTag) -> AppResult<Vec<LocationRecord>> {
        Ok(self
            .locations
            .iter()
            .filter(|l| l.tags.contains(&tag))
            .cloned()
            .collect())
    }

    async fn suitability_rules(&self) -> AppResult<Vec<SuitabilityRule>> {
        self.rules_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rules.clone())
    }
}

fn location(
    slug: &str,
    name: &str,
    summary: &str,
    tags: &[LocationTag],
) -> LocationRecord {
    LocationRecord {
        slug: slug.to_owned(),
        name: name.to_owned(),
        country: DEFAULT_COUNTRY.to_owned(),
        summary: summary.to_owned(),
        tags: tags.to_vec(),
    }
}

fn seed_locations() -> Vec<LocationRecord> {
    vec![
        location(
            "harare",
            "Harare",
            "Capital city with jacaranda-lined avenues, markets, and galleries.",
            &[LocationTag::City],
        ),
        location(
            "victoria-falls",
            "Victoria Falls",
            "The smoke that thunders; one of the largest waterfalls on earth.",
            &[LocationTag::Waterfall, LocationTag::NationalPark],
        ),
        location(
            "hwange",
            "Hwange National Park",
            "Zimbabwe's largest park, famous for elephant herds and wild dog.",
            &[LocationTag::Safari, LocationTag::NationalPark],
        ),
        location(
            "mana-pools",
            "Mana Pools",
            "Remote Zambezi floodplain wilderness for walking safaris and canoeing.",
            &[LocationTag::Safari, LocationTag::NationalPark],
        ),
        location(
            "kariba",
            "Lake Kariba",
            "Vast man-made lake known for houseboats, tigerfish, and sunsets.",
            &[LocationTag::Lake],
        ),
        location(
            "nyanga",
            "Nyanga",
            "Misty highlands with trout streams, pine forests, and Mount Nyangani.",
            &[LocationTag::Mountains, LocationTag::NationalPark],
        ),
        location(
            "great-zimbabwe",
            "Great Zimbabwe",
            "Stone ruins of a medieval city and the country's namesake.",
            &[LocationTag::Ruins],
        ),
        location(
            "bulawayo",
            "Bulawayo",
            "Wide-streeted second city, gateway to Matobo's balancing rocks.",
            &[LocationTag::City],
        ),
    ]
}

fn seed_activities() -> Vec<ActivityRecord> {
    let mk = |id: &str, label: &str, category: &str, description: &str| ActivityRecord {
        id: id.to_owned(),
        label: label.to_owned(),
        category: category.to_owned(),
        description: description.to_owned(),
    };
    vec![
        mk(
            "game-drive",
            "Game drive",
            "safari",
            "Guided wildlife viewing by vehicle, best at dawn and dusk.",
        ),
        mk(
            "walking-safari",
            "Walking safari",
            "safari",
            "On-foot wildlife tracking with an armed professional guide.",
        ),
        mk(
            "hiking",
            "Hiking",
            "outdoor",
            "Day hikes from gentle forest walks to summiting Mount Nyangani.",
        ),
        mk(
            "birdwatching",
            "Birdwatching",
            "outdoor",
            "Over 650 recorded species, from Zambezi waterbirds to highland endemics.",
        ),
        mk(
            "canoeing",
            "Canoeing",
            "water",
            "Multi-day Zambezi canoe trails past hippo pods and drinking elephants.",
        ),
        mk(
            "fishing",
            "Fishing",
            "water",
            "Tigerfish on Kariba and rainbow trout in Nyanga's stocked dams.",
        ),
    ]
}

fn seed_rules() -> Vec<SuitabilityRule> {
    let mk = |id: &str,
              activity_id: Option<&str>,
              category: Option<&str>,
              metric: RuleMetric,
              bands: [f64; 4]| SuitabilityRule {
        id: id.to_owned(),
        activity_id: activity_id.map(str::to_owned),
        category: category.map(str::to_owned),
        metric,
        ideal_min: bands[1],
        ideal_max: bands[2],
        acceptable_min: bands[0],
        acceptable_max: bands[3],
    };
    vec![
        // Activity-specific rules
        mk(
            "hiking-temperature",
            Some("hiking"),
            None,
            RuleMetric::TemperatureC,
            [5.0, 12.0, 26.0, 32.0],
        ),
        mk(
            "canoeing-wind",
            Some("canoeing"),
            None,
            RuleMetric::WindKph,
            [0.0, 0.0, 20.0, 35.0],
        ),
        mk(
            "fishing-precipitation",
            Some("fishing"),
            None,
            RuleMetric::PrecipitationMm,
            [0.0, 0.0, 5.0, 15.0],
        ),
        // Category fallbacks
        mk(
            "safari-precipitation",
            None,
            Some("safari"),
            RuleMetric::PrecipitationMm,
            [0.0, 0.0, 2.0, 10.0],
        ),
        mk(
            "outdoor-uv",
            None,
            Some("outdoor"),
            RuleMetric::UvIndex,
            [0.0, 0.0, 7.0, 10.0],
        ),
        mk(
            "water-wind",
            None,
            Some("water"),
            RuleMetric::WindKph,
            [0.0, 0.0, 25.0, 40.0],
        ),
    ]
}

fn default_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        conditions: "Sunny with scattered afternoon cloud".into(),
        temperature_c: 24.0,
        forecast: Vec::new(),
        insights: Some(WeatherInsights {
            temperature_c: 24.0,
            wind_kph: 12.0,
            precipitation_mm: 0.0,
            humidity_pct: 35.0,
            uv_index: 8.0,
        }),
    }
}

fn seed_weather() -> HashMap<String, WeatherSnapshot> {
    let forecast = |summaries: &[(&str, f64, f64)]| -> Vec<DailyForecast> {
        summaries
            .iter()
            .enumerate()
            .map(|(i, (summary, high, low))| DailyForecast {
                date: format!("2025-06-{:02}", i + 1),
                summary: (*summary).to_owned(),
                high_c: *high,
                low_c: *low,
            })
            .collect()
    };

    let mut weather = HashMap::new();
    weather.insert(
        "harare".to_owned(),
        WeatherSnapshot {
            conditions: "Clear winter sunshine".into(),
            temperature_c: 21.0,
            forecast: forecast(&[("Sunny", 22.0, 7.0), ("Sunny", 21.0, 6.0)]),
            insights: Some(WeatherInsights {
                temperature_c: 21.0,
                wind_kph: 10.0,
                precipitation_mm: 0.0,
                humidity_pct: 30.0,
                uv_index: 6.0,
            }),
        },
    );
    weather.insert(
        "victoria-falls".to_owned(),
        WeatherSnapshot {
            conditions: "Hot and hazy, spray over the gorge".into(),
            temperature_c: 29.0,
            forecast: forecast(&[("Hot", 30.0, 15.0), ("Hot", 31.0, 16.0)]),
            insights: Some(WeatherInsights {
                temperature_c: 29.0,
                wind_kph: 8.0,
                precipitation_mm: 0.0,
                humidity_pct: 40.0,
                uv_index: 9.0,
            }),
        },
    );
    weather.insert(
        "kariba".to_owned(),
        WeatherSnapshot {
            conditions: "Still and hot over the lake".into(),
            temperature_c: 31.0,
            forecast: forecast(&[("Hot", 32.0, 18.0)]),
            insights: Some(WeatherInsights {
                temperature_c: 31.0,
                wind_kph: 28.0,
                precipitation_mm: 0.0,
                humidity_pct: 45.0,
                uv_index: 10.0,
            }),
        },
    );
    weather.insert(
        "nyanga".to_owned(),
        WeatherSnapshot {
            conditions: "Cool mist lifting by mid-morning".into(),
            temperature_c: 14.0,
            forecast: forecast(&[("Misty", 16.0, 5.0)]),
            insights: Some(WeatherInsights {
                temperature_c: 14.0,
                wind_kph: 15.0,
                precipitation_mm: 3.0,
                humidity_pct: 80.0,
                uv_index: 4.0,
            }),
        },
    );
    weather
}
