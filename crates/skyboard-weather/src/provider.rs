//! Contract for the upstream weather source.

use async_trait::async_trait;

use crate::types::{CurrentConditions, RawPollution, RawSample, WeatherError};

/// Source of raw weather data.
///
/// Each call is one independent request. Transport concerns (auth, timeouts,
/// retries) live behind this trait; callers only look at the error's
/// optional message.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions for a free-text city query.
    async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, WeatherError>;

    /// Forecast samples for the next few days, typically three-hourly.
    async fn fetch_forecast_window(&self, lat: f64, lon: f64)
        -> Result<Vec<RawSample>, WeatherError>;

    /// A single observation at `epoch` (Unix seconds).
    async fn fetch_historical_point(
        &self,
        lat: f64,
        lon: f64,
        epoch: i64,
    ) -> Result<RawSample, WeatherError>;

    /// Current air-pollution record.
    async fn fetch_pollution(&self, lat: f64, lon: f64) -> Result<RawPollution, WeatherError>;

    /// Hourly air-pollution forecast.
    async fn fetch_pollution_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<RawPollution>, WeatherError>;
}
