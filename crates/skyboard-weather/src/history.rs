//! Concurrent "N days ago" lookups merged into a date-ordered history.
//!
//! Every lookup in a batch runs to completion (or cancellation) before the
//! merge; a failed day is dropped and reported through the notification
//! sink, never propagated.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::notify::{failure_message, NotificationSink, Severity};
use crate::provider::WeatherProvider;
use crate::types::{HistoricalPoint, RawSample, TemperatureUnit, WeatherError};
use crate::units::{
    epoch_to_date_string, format_temperature, kelvin_to_display, offset_epoch, to_whole,
};

/// Default cap on lookups in flight at once
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Outcome of one history batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBatch {
    /// Successful lookups, ascending by date
    pub points: Vec<HistoricalPoint>,
    pub requested: usize,
    pub failed: usize,
    /// Lookups abandoned because the batch token was cancelled
    pub cancelled: usize,
}

impl HistoricalBatch {
    pub fn succeeded(&self) -> usize {
        self.points.len()
    }
}

/// Midnight epochs for offsets `-1 ..= -days_back`, most recent first.
pub fn lookup_epochs(days_back: u32) -> Vec<i64> {
    (1..=i64::from(days_back)).map(|d| offset_epoch(-d)).collect()
}

/// Build the display point for a successful lookup taken at `epoch`.
pub fn to_historical_point(epoch: i64, sample: &RawSample, unit: TemperatureUnit) -> HistoricalPoint {
    let temperature = to_whole(kelvin_to_display(sample.temperature_kelvin, unit));
    HistoricalPoint {
        date: epoch_to_date_string(epoch),
        temperature_display: format_temperature(temperature, unit),
        weather_main: sample.weather_main.clone(),
        description: sample.weather_description.clone(),
        temperature_kelvin: sample.temperature_kelvin,
        timestamp: epoch,
    }
}

pub struct HistoricalFetchCoordinator {
    provider: Arc<dyn WeatherProvider>,
    sink: Arc<dyn NotificationSink>,
    max_in_flight: usize,
}

impl HistoricalFetchCoordinator {
    pub fn new(provider: Arc<dyn WeatherProvider>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            provider,
            sink,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Limit concurrent lookups. Zero is treated as one.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Look up each of the last `days_back` days at `(lat, lon)`.
    pub async fn collect(
        &self,
        lat: f64,
        lon: f64,
        days_back: u32,
        unit: TemperatureUnit,
        cancel: &CancellationToken,
    ) -> HistoricalBatch {
        let epochs = lookup_epochs(days_back);
        self.collect_at(lat, lon, &epochs, unit, cancel).await
    }

    /// Look up one point per epoch in `epochs`.
    ///
    /// All lookups are issued together, bounded by `max_in_flight`, on the
    /// calling task. The result is sorted by epoch regardless of completion
    /// order. An all-failed batch is an empty batch, not an error.
    pub async fn collect_at(
        &self,
        lat: f64,
        lon: f64,
        epochs: &[i64],
        unit: TemperatureUnit,
        cancel: &CancellationToken,
    ) -> HistoricalBatch {
        if epochs.is_empty() {
            return HistoricalBatch::default();
        }

        let semaphore = Semaphore::new(self.max_in_flight);
        let lookups = epochs.iter().map(|&epoch| {
            let semaphore = &semaphore;
            async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(WeatherError::Cancelled),
                    outcome = async {
                        let _permit = semaphore
                            .acquire()
                            .await
                            .map_err(|_| WeatherError::Cancelled)?;
                        self.provider.fetch_historical_point(lat, lon, epoch).await
                    } => outcome,
                };
                (epoch, outcome)
            }
        });

        let settled = join_all(lookups).await;

        let mut batch = HistoricalBatch {
            requested: epochs.len(),
            ..Default::default()
        };
        for (epoch, outcome) in settled {
            match outcome {
                Ok(sample) => batch.points.push(to_historical_point(epoch, &sample, unit)),
                Err(WeatherError::Cancelled) => batch.cancelled += 1,
                Err(e) => {
                    batch.failed += 1;
                    let date = epoch_to_date_string(epoch);
                    tracing::debug!("Historical lookup for {} failed: {:?}", date, e);
                    self.sink.notify(
                        Severity::Negative,
                        &failure_message(
                            &format!("Failed to get historical weather for {}", date),
                            e.message(),
                        ),
                    );
                }
            }
        }
        batch.points.sort_by_key(|p| p.timestamp);

        tracing::info!(
            "History batch: {} of {} lookups succeeded ({} failed, {} cancelled)",
            batch.succeeded(),
            batch.requested,
            batch.failed,
            batch.cancelled
        );
        batch
    }
}
