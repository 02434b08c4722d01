//! Stop model for geocoded places on a tour

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// Latitude and longitude in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Returns `None` unless both values are finite and inside the valid ranges.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }
}

/// A named place with resolved coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Stop {
    /// Place name as suggested by the agent
    pub name: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Stop {
    #[must_use]
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            lat: coordinates.lat,
            lon: coordinates.lon,
        }
    }

    /// Great-circle distance to another stop in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Stop) -> f64 {
        let from = HaversineLocation {
            latitude: self.lat,
            longitude: self.lon,
        };
        let to = HaversineLocation {
            latitude: other.lat,
            longitude: other.lon,
        };
        distance(from, to, Units::Kilometers)
    }
}

/// Total length of the path visiting `stops` in order
#[must_use]
pub fn route_length_km(stops: &[Stop]) -> f64 {
    stops.windows(2).map(|pair| pair[0].distance_km(&pair[1])).sum()
}
