//! `FoodieTour` - weather-aware food tour planning
//!
//! For each requested city this library looks up the current weather, asks an
//! agent service for dishes, restaurants and an itinerary, geocodes the named
//! places and renders the result as an HTML map page with JSON and PDF exports.

pub mod agent;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod geocoding;
pub mod http;
pub mod images;
pub mod logging;
pub mod models;
pub mod planner;
pub mod render;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use agent::{AgentClient, ItineraryGenerator, ItineraryRequest};
pub use cache::Cache;
pub use config::FoodieTourConfig;
pub use error::FoodieTourError;
pub use geocoding::{Geocoder, NominatimGeocoder};
pub use images::{ImageSearch, NoImages, UnsplashClient};
pub use models::{CityFailure, Stop, TourBatch, TourPlan, TourRequest};
pub use planner::{LogProgress, PlanStage, ProgressReporter, TourPlanner};
pub use weather::{WeatherApiClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, FoodieTourError>;
