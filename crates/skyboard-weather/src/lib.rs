//! Weather aggregation for Skyboard
//!
//! Turns raw provider responses (three-hourly forecast samples, historical
//! point lookups, pollutant readings) into unit-consistent display records,
//! with an OpenWeather provider and LocationIQ geocoding on the edges.

pub mod aggregate;
pub mod air_quality;
pub mod dashboard;
pub mod geocode;
pub mod history;
pub mod notify;
pub mod openweather;
pub mod provider;
pub mod types;
pub mod units;
pub mod view;

pub use types::*;
pub use aggregate::{aggregate_daily, hourly_outlook};
pub use air_quality::{annotate, classify, AqiClass, AqiLevel, ColorTier};
pub use dashboard::{Dashboard, DashboardData, DashboardSettings, DashboardView};
pub use geocode::{GeocodeError, LocationIqClient, Place};
pub use history::{HistoricalBatch, HistoricalFetchCoordinator};
pub use notify::{CollectingSink, Notification, NotificationSink, Severity, TracingSink};
pub use openweather::{OpenWeatherClient, OpenWeatherSettings};
pub use provider::WeatherProvider;
