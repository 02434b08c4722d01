//! Tour planning pipeline
//!
//! Runs weather → itinerary → merge → geocode for one city at a time and
//! collects the results of a whole request into a [`TourBatch`].

use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use crate::agent::{AgentClient, ItineraryGenerator, ItineraryRequest};
use crate::cache::Cache;
use crate::config::FoodieTourConfig;
use crate::geocoding::{Geocoder, NominatimGeocoder};
use crate::models::{CityFailure, DietaryPreference, Stop, TourBatch, TourPlan, TourRequest};
use crate::weather::{WeatherApiClient, WeatherProvider};
use crate::{FoodieTourError, Result};

/// Coarse progress steps reported while planning a city
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStage {
    Weather,
    Itinerary,
    Merged,
    Geocoded,
    Complete,
}

impl PlanStage {
    pub const COUNT: u8 = 5;

    /// 1-based position of this stage
    #[must_use]
    pub fn step(self) -> u8 {
        match self {
            PlanStage::Weather => 1,
            PlanStage::Itinerary => 2,
            PlanStage::Merged => 3,
            PlanStage::Geocoded => 4,
            PlanStage::Complete => 5,
        }
    }
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanStage::Weather => "weather",
            PlanStage::Itinerary => "itinerary",
            PlanStage::Merged => "merge",
            PlanStage::Geocoded => "geocoding",
            PlanStage::Complete => "complete",
        };
        f.write_str(label)
    }
}

/// Receives progress while a city is planned
pub trait ProgressReporter: Send {
    /// `step` of `total` has finished for `city`
    fn advance(&mut self, city: &str, stage: PlanStage, step: u8, total: u8);

    fn reach(&mut self, city: &str, stage: PlanStage) {
        self.advance(city, stage, stage.step(), PlanStage::COUNT);
    }
}

/// Logs each step through `tracing`
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn advance(&mut self, city: &str, stage: PlanStage, step: u8, total: u8) {
        info!(
            "[{}] {}/{} {} ({:.0}%)",
            city,
            step,
            total,
            stage,
            percent(step, total)
        );
    }
}

fn percent(step: u8, total: u8) -> f32 {
    f32::from(step) * 100.0 / f32::from(total.max(1))
}

/// Sequences the external lookups for each city
#[derive(Clone)]
pub struct TourPlanner {
    weather: Arc<dyn WeatherProvider>,
    itineraries: Arc<dyn ItineraryGenerator>,
    geocoder: Arc<dyn Geocoder>,
}

impl TourPlanner {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        itineraries: Arc<dyn ItineraryGenerator>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            weather,
            itineraries,
            geocoder,
        }
    }

    /// Wires the HTTP-backed services described by `config`
    pub fn from_config(config: &FoodieTourConfig, cache: Cache) -> Result<Self> {
        let weather = WeatherApiClient::new(&config.weather, cache.clone())?;
        let agent = AgentClient::new(&config.agent)?;
        let geocoder = NominatimGeocoder::new(&config.geocoding, cache)?;
        Ok(Self::new(
            Arc::new(weather),
            Arc::new(agent),
            Arc::new(geocoder),
        ))
    }

    /// Plans a single city. Weather and agent failures abort the city.
    pub async fn plan_city(
        &self,
        city: &str,
        prefs: &[DietaryPreference],
        surprise: bool,
        progress: &mut dyn ProgressReporter,
    ) -> Result<TourPlan> {
        let weather = self.weather.current(city).await?;
        progress.reach(city, PlanStage::Weather);

        let request = ItineraryRequest {
            city: city.to_string(),
            temp: weather.temp_c,
            condition: weather.condition.clone(),
            prefs: prefs.iter().map(ToString::to_string).collect(),
            surprise,
        };
        let payload = self.itineraries.generate(request).await?;
        progress.reach(city, PlanStage::Itinerary);

        let places = payload.places();
        let plan = TourPlan::from_parts(city, weather, payload);
        progress.reach(city, PlanStage::Merged);

        let stops = self.locate_all(&places, city).await;
        info!("[{}] {} of {} places geocoded", city, stops.len(), places.len());
        progress.reach(city, PlanStage::Geocoded);

        let plan = plan.with_stops(stops);
        progress.reach(city, PlanStage::Complete);
        Ok(plan)
    }

    /// Geocodes places in order, dropping the ones that can't be found
    async fn locate_all(&self, places: &[String], city: &str) -> Vec<Stop> {
        let mut stops = Vec::with_capacity(places.len());
        for place in places {
            if let Some(coords) = self.geocoder.locate(place, city).await {
                stops.push(Stop::new(place.clone(), coords));
            }
        }
        stops
    }

    /// Plans every requested city in order. A failing city is recorded and skipped.
    pub async fn plan_tours(
        &self,
        request: &TourRequest,
        progress: &mut dyn ProgressReporter,
    ) -> TourBatch {
        let mut batch = TourBatch::new();

        for city in request.city_list() {
            match self
                .plan_city(&city, &request.prefs, request.surprise, progress)
                .await
            {
                Ok(plan) => batch.tours.push(plan),
                Err(e) => {
                    error!("Could not plan {}: {}", city, e);
                    batch.failures.push(failure_for(&city, &e));
                }
            }
        }

        batch
    }
}

fn failure_for(city: &str, err: &FoodieTourError) -> CityFailure {
    let message = match err {
        FoodieTourError::Parse { message, .. } => {
            format!("Error parsing AI output for {city}: {message}")
        }
        FoodieTourError::Execution { .. } => format!("Could not plan {city}"),
        other => format!("Could not plan {city}: {other}"),
    };
    CityFailure {
        city: city.to_string(),
        message,
        raw_output: err.raw_output().map(str::to_string),
    }
}
