//! Full dashboard load: current conditions, then forecast, air quality, the
//! air-quality outlook and history side by side.
//!
//! Loading and rendering are separate so a unit change re-renders the last
//! load without going back to the provider.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{aggregate_daily, hourly_outlook};
use crate::air_quality::annotate;
use crate::history::{HistoricalBatch, HistoricalFetchCoordinator, DEFAULT_MAX_IN_FLIGHT};
use crate::notify::{failure_message, NotificationSink, Severity};
use crate::provider::WeatherProvider;
use crate::types::{
    Coordinates, CurrentConditions, HourlyPoint, PollutionReading, RawSample, TemperatureUnit,
    WeatherError,
};
use crate::view::{
    to_air_quality_outlook, to_air_quality_view, to_forecast_view, to_hero_view,
    to_historical_view, to_stats_view, AirQualityOutlookRow, AirQualityView, ForecastRow,
    HeroView, HistoricalRow, StatItem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub unit: TemperatureUnit,
    /// Past days sampled for the history section
    pub history_days: u32,
    pub max_in_flight: usize,
    /// Forecast slots shown in the hourly strip and the air-quality outlook
    pub forecast_hours: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            unit: TemperatureUnit::Celsius,
            history_days: 5,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            forecast_hours: 8,
        }
    }
}

/// Provider data behind one load. Sections that failed are `None`; the
/// failure has already been notified.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub current: CurrentConditions,
    pub coordinates: Coordinates,
    pub forecast: Option<Vec<RawSample>>,
    pub pollution: Option<PollutionReading>,
    pub pollution_forecast: Option<Vec<PollutionReading>>,
    pub history: HistoricalBatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub unit: TemperatureUnit,
    pub coordinates: Coordinates,
    pub hero: HeroView,
    pub stats: Vec<StatItem>,
    pub daily: Vec<ForecastRow>,
    pub hourly: Vec<HourlyPoint>,
    pub air_quality: Option<AirQualityView>,
    pub air_quality_outlook: Vec<AirQualityOutlookRow>,
    pub history: Vec<HistoricalRow>,
    pub history_failed: usize,
}

pub struct Dashboard {
    provider: Arc<dyn WeatherProvider>,
    sink: Arc<dyn NotificationSink>,
    history: HistoricalFetchCoordinator,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        sink: Arc<dyn NotificationSink>,
        settings: DashboardSettings,
    ) -> Self {
        let history = HistoricalFetchCoordinator::new(provider.clone(), sink.clone())
            .with_max_in_flight(settings.max_in_flight);
        Self {
            provider,
            sink,
            history,
            settings,
        }
    }

    /// Change the display unit. Applies to every later load and render;
    /// a load already in progress keeps the unit it started with.
    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        if self.settings.unit != unit {
            tracing::info!("Temperature unit changed to {}", unit);
        }
        self.settings.unit = unit;
    }

    fn report(&self, context: &str, error: &WeatherError) {
        tracing::debug!("{}: {:?}", context, error);
        self.sink
            .notify(Severity::Negative, &failure_message(context, error.message()));
    }

    /// Load everything for `city`.
    ///
    /// Fails only when current conditions cannot be fetched (or carry no
    /// coordinates), or when `cancel` fires before the fan-out starts.
    /// Forecast, air-quality, outlook and history failures are notified and leave
    /// their section empty.
    pub async fn load(
        &self,
        city: &str,
        cancel: &CancellationToken,
    ) -> Result<DashboardData, WeatherError> {
        let unit = self.settings.unit;

        let current = match self.provider.fetch_current(city).await {
            Ok(current) => current,
            Err(e) => {
                self.report("Failed to get weather", &e);
                return Err(e);
            }
        };

        let Some(coordinates) = current.coord else {
            let e = WeatherError::MissingField("coord");
            self.report("Failed to get weather", &e);
            return Err(e);
        };

        if cancel.is_cancelled() {
            tracing::debug!("Load for {} cancelled before fan-out", city);
            return Err(WeatherError::Cancelled);
        }

        let Coordinates { lat, lon } = coordinates;
        let (forecast, pollution, pollution_forecast, history) = tokio::join!(
            self.load_forecast(lat, lon),
            self.load_pollution(lat, lon),
            self.load_pollution_forecast(lat, lon),
            self.history
                .collect(lat, lon, self.settings.history_days, unit, cancel),
        );

        tracing::info!(
            "Loaded dashboard for {} ({} forecast samples, {} history days)",
            city,
            forecast.as_ref().map(Vec::len).unwrap_or(0),
            history.succeeded()
        );

        Ok(DashboardData {
            current,
            coordinates,
            forecast: forecast.ok(),
            pollution: pollution.ok(),
            pollution_forecast: pollution_forecast.ok(),
            history,
        })
    }

    pub async fn load_forecast(&self, lat: f64, lon: f64) -> Result<Vec<RawSample>, WeatherError> {
        self.provider
            .fetch_forecast_window(lat, lon)
            .await
            .inspect_err(|e| self.report("Failed to get forecast weather", e))
    }

    pub async fn load_pollution(&self, lat: f64, lon: f64) -> Result<PollutionReading, WeatherError> {
        self.provider
            .fetch_pollution(lat, lon)
            .await
            .map(|raw| annotate(&raw))
            .inspect_err(|e| self.report("Failed to get air pollution", e))
    }

    pub async fn load_pollution_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<PollutionReading>, WeatherError> {
        self.provider
            .fetch_pollution_forecast(lat, lon)
            .await
            .map(|list| list.iter().map(annotate).collect())
            .inspect_err(|e| self.report("Failed to get air pollution forecast", e))
    }

    /// Build display records from `data` in the current unit.
    pub fn render(&self, data: &DashboardData) -> DashboardView {
        let unit = self.settings.unit;
        let samples = data.forecast.as_deref().unwrap_or(&[]);
        let daily = aggregate_daily(samples, unit);

        DashboardView {
            unit,
            coordinates: data.coordinates,
            hero: to_hero_view(&data.current, unit),
            stats: to_stats_view(&data.current, unit),
            daily: to_forecast_view(&daily, unit),
            hourly: hourly_outlook(samples, unit, self.settings.forecast_hours),
            air_quality: data.pollution.as_ref().map(to_air_quality_view),
            air_quality_outlook: to_air_quality_outlook(
                data.pollution_forecast.as_deref().unwrap_or(&[]),
                self.settings.forecast_hours,
            ),
            history: to_historical_view(&data.history.points, unit),
            history_failed: data.history.failed,
        }
    }
}
