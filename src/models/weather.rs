//! Current weather model and display methods

use serde::{Deserialize, Serialize};

/// Current conditions for a city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Temperature in Celsius
    pub temp_c: f64,
    /// Human-readable description of weather conditions
    pub condition: String,
}

impl CurrentWeather {
    #[must_use]
    pub fn new(temp_c: f64, condition: impl Into<String>) -> Self {
        Self {
            temp_c,
            condition: condition.into(),
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{}°C", self.temp_c)
    }

    /// "Partly cloudy, 18°C"
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}, {}", self.condition, self.format_temperature())
    }
}
