//! Data models for the `FoodieTour` application

pub mod request;
pub mod stop;
pub mod tour;
pub mod weather;

pub use request::{DietaryPreference, TourRequest};
pub use stop::{Coordinates, Stop};
pub use tour::{CityFailure, DiningStyle, ItineraryPayload, RestaurantGuide, TourBatch, TourPlan};
pub use weather::CurrentWeather;
