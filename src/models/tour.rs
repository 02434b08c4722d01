//! Tour plan model: the merged per-city result

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::{CurrentWeather, Stop};
use crate::models::stop::route_length_km;

/// Where the agent suggests eating given the weather
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DiningStyle {
    Indoor,
    Outdoor,
}

impl TryFrom<String> for DiningStyle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "indoor" => Ok(DiningStyle::Indoor),
            "outdoor" => Ok(DiningStyle::Outdoor),
            other => Err(format!(
                "dining must be \"Indoor\" or \"Outdoor\", got \"{other}\""
            )),
        }
    }
}

impl fmt::Display for DiningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiningStyle::Indoor => f.write_str("Indoor"),
            DiningStyle::Outdoor => f.write_str("Outdoor"),
        }
    }
}

/// Dish → restaurant names, in the order the agent listed the dishes.
///
/// Serialized as a JSON object; a plain map would lose the dish order that
/// the stop sequence depends on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantGuide(Vec<(String, Vec<String>)>);

impl RestaurantGuide {
    #[must_use]
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(dish, restaurants)| (dish.as_str(), restaurants.as_slice()))
    }

    /// All restaurant names flattened in dish order
    pub fn all_restaurants(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .flat_map(|(_, restaurants)| restaurants.iter().map(String::as_str))
    }
}

impl Serialize for RestaurantGuide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (dish, restaurants) in &self.0 {
            map.serialize_entry(dish, restaurants)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RestaurantGuide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GuideVisitor;

        impl<'de> Visitor<'de> for GuideVisitor {
            type Value = RestaurantGuide;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of dish names to lists of restaurant names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(3));
                while let Some((dish, restaurants)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((dish, restaurants));
                }
                Ok(RestaurantGuide(entries))
            }
        }

        deserializer.deserialize_map(GuideVisitor)
    }
}

/// The JSON object the agent is asked to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryPayload {
    pub dining: DiningStyle,
    pub dishes: Vec<String>,
    pub restaurants: RestaurantGuide,
    pub itinerary: String,
    #[serde(default)]
    pub bonus_stop: Option<String>,
    pub trivia: String,
}

impl ItineraryPayload {
    /// The bonus stop, treating blank strings as absent
    #[must_use]
    pub fn bonus_stop(&self) -> Option<&str> {
        self.bonus_stop
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Places to geocode: restaurants in dish order, then the bonus stop.
    /// Repeated names keep their first position.
    #[must_use]
    pub fn places(&self) -> Vec<String> {
        let mut places: Vec<String> = Vec::new();
        let candidates = self.restaurants.all_restaurants().chain(self.bonus_stop());
        for place in candidates {
            if !places.iter().any(|p| p == place) {
                places.push(place.to_string());
            }
        }
        places
    }

    /// Describes how the payload departs from "3 dishes, 3 restaurants each"
    #[must_use]
    pub fn cardinality_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.dishes.len() != 3 {
            issues.push(format!("expected 3 dishes, got {}", self.dishes.len()));
        }
        for (dish, restaurants) in self.restaurants.iter() {
            if restaurants.len() != 3 {
                issues.push(format!(
                    "expected 3 restaurants for {dish}, got {}",
                    restaurants.len()
                ));
            }
        }
        issues
    }
}

/// Merged per-city result: weather, agent content and geocoded stops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourPlan {
    pub city: String,
    /// Temperature in Celsius
    pub temp: f64,
    pub cond: String,
    pub dining: DiningStyle,
    pub dishes: Vec<String>,
    pub restaurants: RestaurantGuide,
    pub itinerary: String,
    pub bonus_stop: Option<String>,
    pub trivia: String,
    pub stops: Vec<Stop>,
}

impl TourPlan {
    /// Merges weather into the agent payload. Stops are attached separately.
    #[must_use]
    pub fn from_parts(city: &str, weather: CurrentWeather, payload: ItineraryPayload) -> Self {
        let bonus_stop = payload.bonus_stop().map(str::to_string);
        Self {
            city: city.to_string(),
            temp: weather.temp_c,
            cond: weather.condition,
            dining: payload.dining,
            dishes: payload.dishes,
            restaurants: payload.restaurants,
            itinerary: payload.itinerary,
            bonus_stop,
            trivia: payload.trivia,
            stops: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_stops(mut self, stops: Vec<Stop>) -> Self {
        self.stops = stops;
        self
    }

    #[must_use]
    pub fn weather(&self) -> CurrentWeather {
        CurrentWeather::new(self.temp, self.cond.clone())
    }

    /// Length of the walking route through all stops
    #[must_use]
    pub fn route_length_km(&self) -> f64 {
        route_length_km(&self.stops)
    }
}

/// A city that could not be planned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityFailure {
    pub city: String,
    pub message: String,
    /// Raw agent output when the failure was a parse error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

/// Result of one "Generate" action over all requested cities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourBatch {
    pub generated_at: DateTime<Utc>,
    pub tours: Vec<TourPlan>,
    pub failures: Vec<CityFailure>,
}

impl TourBatch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            tours: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl Default for TourBatch {
    fn default() -> Self {
        Self::new()
    }
}
