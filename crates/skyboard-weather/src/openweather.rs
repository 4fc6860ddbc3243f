//! OpenWeather HTTP implementation of [`WeatherProvider`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::provider::WeatherProvider;
use crate::types::{CurrentConditions, PollutantComponents, RawPollution, RawSample, WeatherError};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "Skyboard/0.1.0";

/// Endpoints and credentials for [`OpenWeatherClient`].
#[derive(Debug, Clone)]
pub struct OpenWeatherSettings {
    pub api_key: String,
    /// Free-tier API root (`/weather`, `/forecast`, `/air_pollution`)
    pub base_url: String,
    /// One Call API root (`/onecall/timemachine`)
    pub onecall_url: String,
    pub timeout: Duration,
}

impl OpenWeatherSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            onecall_url: DEFAULT_ONECALL_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Arc<Client>,
    settings: OpenWeatherSettings,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireCondition {
    main: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: ForecastMain,
    #[serde(default)]
    weather: Vec<WireCondition>,
    #[serde(default)]
    wind: WireWind,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct TimeMachinePoint {
    dt: i64,
    temp: f64,
    #[serde(default)]
    humidity: f64,
    #[serde(default)]
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<WireCondition>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TimeMachineResponse {
    #[serde(default)]
    data: Vec<TimeMachinePoint>,
}

#[derive(Debug, Deserialize)]
struct PollutionMain {
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct PollutionItem {
    dt: i64,
    main: PollutionMain,
    #[serde(default)]
    components: PollutantComponents,
}

#[derive(Debug, Deserialize)]
struct PollutionResponse {
    #[serde(default)]
    list: Vec<PollutionItem>,
}

fn to_sample(
    dt: i64,
    temp: f64,
    humidity: f64,
    wind_speed: f64,
    weather: Vec<WireCondition>,
    pop: Option<f64>,
) -> RawSample {
    let condition = weather.into_iter().next().unwrap_or_default();
    RawSample {
        timestamp: dt,
        temperature_kelvin: temp,
        humidity_percent: humidity,
        wind_speed,
        weather_main: condition.main,
        weather_description: condition.description,
        precipitation_probability: pop,
    }
}

impl From<ForecastItem> for RawSample {
    fn from(item: ForecastItem) -> Self {
        to_sample(
            item.dt,
            item.main.temp,
            item.main.humidity,
            item.wind.speed,
            item.weather,
            item.pop,
        )
    }
}

impl From<TimeMachinePoint> for RawSample {
    fn from(point: TimeMachinePoint) -> Self {
        to_sample(
            point.dt,
            point.temp,
            point.humidity,
            point.wind_speed,
            point.weather,
            point.pop,
        )
    }
}

impl From<PollutionItem> for RawPollution {
    fn from(item: PollutionItem) -> Self {
        RawPollution {
            timestamp: item.dt,
            aqi: item.main.aqi,
            components: item.components,
        }
    }
}

impl OpenWeatherClient {
    pub fn new(settings: OpenWeatherSettings) -> Result<Self, WeatherError> {
        if settings.api_key.trim().is_empty() {
            return Err(WeatherError::Configuration(
                "OpenWeather API key is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            settings,
        })
    }

    fn coords_query(&self, lat: f64, lon: f64) -> [(&'static str, String); 3] {
        [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", self.settings.api_key.clone()),
        ]
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let response = self.client.get(url).query(query).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or(text);

        tracing::debug!("OpenWeather returned {}: {}", status, message);
        Err(WeatherError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        let url = format!("{}/weather", self.settings.base_url);
        let query = [
            ("q", city.to_string()),
            ("appid", self.settings.api_key.clone()),
        ];
        self.get_json(&url, &query).await
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast_window(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<RawSample>, WeatherError> {
        let url = format!("{}/forecast", self.settings.base_url);
        let body: ForecastResponse = self.get_json(&url, &self.coords_query(lat, lon)).await?;
        tracing::debug!("Forecast window has {} samples", body.list.len());
        Ok(body.list.into_iter().map(RawSample::from).collect())
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_historical_point(
        &self,
        lat: f64,
        lon: f64,
        epoch: i64,
    ) -> Result<RawSample, WeatherError> {
        let url = format!("{}/onecall/timemachine", self.settings.onecall_url);
        let mut query = self.coords_query(lat, lon).to_vec();
        query.push(("dt", epoch.to_string()));

        let body: TimeMachineResponse = self.get_json(&url, &query).await?;
        body.data
            .into_iter()
            .next()
            .map(RawSample::from)
            .ok_or(WeatherError::MissingField("data[0]"))
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_pollution(&self, lat: f64, lon: f64) -> Result<RawPollution, WeatherError> {
        let url = format!("{}/air_pollution", self.settings.base_url);
        let body: PollutionResponse = self.get_json(&url, &self.coords_query(lat, lon)).await?;
        body.list
            .into_iter()
            .next()
            .map(RawPollution::from)
            .ok_or(WeatherError::MissingField("list[0]"))
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_pollution_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<RawPollution>, WeatherError> {
        let url = format!("{}/air_pollution/forecast", self.settings.base_url);
        let body: PollutionResponse = self.get_json(&url, &self.coords_query(lat, lon)).await?;
        Ok(body.list.into_iter().map(RawPollution::from).collect())
    }
}
