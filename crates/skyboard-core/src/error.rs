//! Application-level error types.
//!
//! Library crates keep their own error enums; this module folds them into
//! one [`AppError`] for the binary, with `user_message()` for display.

use skyboard_weather::{GeocodeError, WeatherError};
use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No place found at {lat}, {lon}")]
    LocationNotFound { lat: f64, lon: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Weather(e) => e.user_message(),
            AppError::Geocode(e) => geocode_user_message(e),
            AppError::Config(e) => e.user_message(),
            AppError::LocationNotFound { .. } => {
                "No place found at those coordinates. Try a city name instead."
            }
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

fn geocode_user_message(error: &GeocodeError) -> &'static str {
    match error {
        GeocodeError::Network(_) => "Unable to reach the geocoding service. Check your connection.",
        GeocodeError::Api { status: 401, .. } => "Geocoding token is invalid. Check settings.",
        GeocodeError::Api { status, .. } if *status >= 500 => {
            "The geocoding service is having issues. Please try again later."
        }
        GeocodeError::Api { .. } => "Place lookup failed. Please try again.",
        GeocodeError::Parse(_) => "Received an unexpected response. Please try again.",
        GeocodeError::Configuration(_) => "Geocoding is not configured. Check settings.",
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}
