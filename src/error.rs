//! Error types and handling for `FoodieTour`

use thiserror::Error;

/// Main error type for the `FoodieTour` application
#[derive(Error, Debug)]
pub enum FoodieTourError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The agent execution ended without producing a plan
    #[error("Execution error: {message}")]
    Execution { message: String },

    /// The agent output could not be turned into an itinerary
    #[error("Error parsing AI output: {message}")]
    Parse { message: String, raw: String },
}

impl FoodieTourError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new execution error
    pub fn execution<S: Into<String>>(message: S) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Create a new parse error carrying the offending raw output
    pub fn parse<S: Into<String>, R: Into<String>>(message: S, raw: R) -> Self {
        Self::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Raw upstream output attached to parse errors
    #[must_use]
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            FoodieTourError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FoodieTourError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            FoodieTourError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            FoodieTourError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            FoodieTourError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            FoodieTourError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            FoodieTourError::Execution { .. } => {
                "The tour planner agent did not finish successfully.".to_string()
            }
            FoodieTourError::Parse { message, raw } => {
                format!("Error parsing AI output: {message}\nOutput was: {raw}")
            }
        }
    }
}

/// Recovers a typed error from an `anyhow` chain, wrapping anything else as an API error.
impl From<anyhow::Error> for FoodieTourError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<FoodieTourError>() {
            Ok(typed) => typed,
            Err(other) => FoodieTourError::api(format!("{other:#}")),
        }
    }
}
