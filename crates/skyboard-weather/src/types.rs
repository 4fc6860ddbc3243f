use serde::{Deserialize, Serialize};

use crate::air_quality::ColorTier;

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Suffix appended to formatted temperatures ("°C" / "°F")
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Celsius => write!(f, "celsius"),
            Self::Fahrenheit => write!(f, "fahrenheit"),
        }
    }
}

impl std::str::FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(Self::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

/// One time-stamped provider observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    /// Unix seconds
    pub timestamp: i64,
    pub temperature_kelvin: f64,
    pub humidity_percent: f64,
    pub wind_speed: f64,
    pub weather_main: String,
    pub weather_description: String,
    /// Probability of precipitation in `0.0..=1.0`
    pub precipitation_probability: Option<f64>,
}

/// All same-day samples reduced to display statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    /// Local calendar day, "YYYY/MM/DD"
    pub date: String,
    pub min_temp: i64,
    pub max_temp: i64,
    pub avg_humidity: i64,
    pub avg_wind_speed: i64,
    pub dominant_description: String,
    pub dominant_weather_main: String,
    /// Percentage, 0 when no sample carried a probability
    pub max_precipitation_probability: i64,
    /// Unit `min_temp` / `max_temp` are expressed in
    pub unit: TemperatureUnit,
    /// Source extrema, kept so the day can be re-rendered under another unit.
    /// NaN when no sample of the day carried a finite temperature.
    #[serde(skip)]
    pub min_kelvin: f64,
    #[serde(skip)]
    pub max_kelvin: f64,
}

/// Single forecast slot for the hourly strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    pub date: String,
    /// Local time, "HH:MM"
    pub time: String,
    pub temperature: i64,
    pub weather_main: String,
    pub precipitation_probability: i64,
}

/// Pollutant concentrations in µg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollutantComponents {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

/// Unclassified air-pollution record as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPollution {
    pub timestamp: i64,
    pub aqi: i64,
    pub components: PollutantComponents,
}

/// Air-pollution record annotated with its AQI classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollutionReading {
    pub timestamp: i64,
    pub aqi: i64,
    pub label: String,
    pub color_tier: ColorTier,
    pub components: PollutantComponents,
}

/// One successful "N days ago" lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPoint {
    pub date: String,
    pub temperature_display: String,
    pub weather_main: String,
    pub description: String,
    /// Source reading, kept so the point can be re-rendered under another unit
    #[serde(skip)]
    pub temperature_kelvin: f64,
    #[serde(skip)]
    pub timestamp: i64,
}

/// Current-weather record. Every nested field is optional; the view layer
/// decides the default for each one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConditions {
    pub name: Option<String>,
    pub coord: Option<Coordinates>,
    pub sys: Option<SysInfo>,
    /// Temperatures in Kelvin
    pub main: Option<MainReadings>,
    pub weather: Vec<ConditionTag>,
    pub wind: Option<WindReading>,
    pub dt: Option<i64>,
}

impl CurrentConditions {
    /// Primary condition entry, if the provider sent any
    pub fn primary_condition(&self) -> Option<&ConditionTag> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysInfo {
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainReadings {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionTag {
    pub main: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindReading {
    pub speed: Option<f64>,
    pub deg: Option<f64>,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Missing field in provider response: {0}")]
    MissingField(&'static str),
    #[error("Request cancelled")]
    Cancelled,
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WeatherError {
    /// Human-readable detail carried by the error, when there is one.
    ///
    /// Provider errors yield the `message` field of the error body; an empty
    /// body yields `None`.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Api { message, .. } if message.trim().is_empty() => None,
            Self::Api { message, .. } => Some(message.clone()),
            Self::Network(e) => Some(e.to_string()),
            Self::Parse(msg) | Self::Configuration(msg) => Some(msg.clone()),
            Self::MissingField(field) => Some(format!("missing {}", field)),
            Self::Cancelled => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Unable to reach the weather service. Check your connection.",
            Self::Api { status: 404, .. } => "Location not found. Check and try again.",
            Self::Api { status: 401, .. } => "Weather API key is invalid. Check settings.",
            Self::Api { status, .. } if *status >= 500 => {
                "Weather service unavailable. Please try again later."
            }
            Self::Api { .. } => "Weather service error. Please try again.",
            Self::Parse(_) | Self::MissingField(_) => {
                "Received an unexpected response from the weather service."
            }
            Self::Cancelled => "The request was cancelled.",
            Self::Configuration(_) => "Weather service is not configured. Check settings.",
        }
    }
}
