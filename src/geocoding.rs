//! Place geocoding
//!
//! Resolves restaurant and landmark names to coordinates through a
//! Nominatim-style search endpoint. Lookups never fail: any problem yields
//! `None` and the place is simply left off the map.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cache::Cache;
use crate::config::GeocodingConfig;
use crate::http::{build_client, trim_base_url};
use crate::models::Coordinates;

/// Resolves a place within a city to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, name: &str, city: &str) -> Option<Coordinates>;
}

/// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
    cache: Cache,
    cache_ttl: Duration,
}

/// What a successful round trip told us; transport failures are not cached
type Lookup = Option<Coordinates>;

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig, cache: Cache) -> Result<Self> {
        let client = build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            0,
            &config.user_agent,
        )?;
        Ok(Self {
            client,
            base_url: trim_base_url(&config.base_url),
            cache,
            cache_ttl: config.cache_ttl(),
        })
    }

    fn cache_key(name: &str, city: &str) -> String {
        format!("geocode:{}|{}", name.trim().to_lowercase(), city.trim().to_lowercase())
    }

    async fn search(&self, query: &str) -> Result<Lookup> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );
        debug!("Geocoding request URL: {}", url);

        let results: Vec<SearchResult> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("Failed to parse geocoding response for '{query}'"))?;

        let Some(best) = results.first() else {
            return Ok(None);
        };
        let lat: f64 = best
            .lat
            .parse()
            .with_context(|| format!("Invalid latitude for '{query}': {}", best.lat))?;
        let lon: f64 = best
            .lon
            .parse()
            .with_context(|| format!("Invalid longitude for '{query}': {}", best.lon))?;

        Ok(Coordinates::new(lat, lon))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn locate(&self, name: &str, city: &str) -> Option<Coordinates> {
        let key = Self::cache_key(name, city);
        match self.cache.get::<Lookup>(&key).await {
            Ok(Some(cached)) => {
                debug!("Using cached coordinates for '{}'", name);
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!("Geocode cache read failed: {:#}", e),
        }

        match self.search(&format!("{name}, {city}")).await {
            Ok(lookup) => {
                if lookup.is_none() {
                    debug!("No geocoding result for '{}' in {}", name, city);
                }
                if let Err(e) = self.cache.put(&key, lookup, self.cache_ttl).await {
                    warn!("Geocode cache write failed: {:#}", e);
                }
                lookup
            }
            Err(e) => {
                warn!("Geocoding '{}' in {} failed: {:#}", name, city, e);
                None
            }
        }
    }
}
