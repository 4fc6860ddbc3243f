//! Display records for the dashboard.
//!
//! Every function here is total: a missing field falls back to the default
//! documented on the corresponding view field, it never produces an error.

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::air_quality::ColorTier;
use crate::types::{
    CurrentConditions, DailyAggregate, HistoricalPoint, PollutionReading, TemperatureUnit,
};
use crate::units::{
    epoch_to_date_string_in, epoch_to_hour_string_in, format_temperature, kelvin_to_display,
    round_half_up, to_whole,
};

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
const DEFAULT_WEATHER_MAIN: &str = "Clear";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroView {
    /// "City, CC"; either part is omitted when missing
    pub city_label: String,
    /// Missing temperature renders as 0
    pub temperature_display: String,
    pub feels_like_display: String,
    /// Condition description, "" when missing
    pub condition: String,
    /// "Clear" when missing
    pub weather_main: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatItem {
    pub icon: String,
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sublabel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRow {
    pub date: String,
    pub max_temp: i64,
    pub min_temp: i64,
    pub max_display: String,
    pub min_display: String,
    pub description: String,
    pub weather_main: String,
    pub wind_speed: i64,
    pub humidity: i64,
    pub precipitation_probability: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRow {
    pub date: String,
    pub temperature: i64,
    pub temperature_display: String,
    pub weather_main: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentRow {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityView {
    pub aqi: i64,
    pub label: String,
    pub color_tier: ColorTier,
    pub components: Vec<ComponentRow>,
}

/// One upcoming hour of the air-quality outlook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityOutlookRow {
    pub date: String,
    pub time: String,
    pub aqi: i64,
    pub label: String,
    pub color_tier: ColorTier,
}

/// 8-point compass bearing for `deg`, via `round(deg / 45) mod 8`.
pub fn wind_direction(deg: f64) -> &'static str {
    let index = to_whole(round_half_up(deg / 45.0)).rem_euclid(8) as usize;
    COMPASS[index]
}

fn display_kelvin(kelvin: Option<f64>, unit: TemperatureUnit) -> String {
    let value = kelvin
        .map(|k| to_whole(kelvin_to_display(k, unit)))
        .unwrap_or(0);
    format_temperature(value, unit)
}

fn or_clear(weather_main: &str) -> String {
    if weather_main.trim().is_empty() {
        DEFAULT_WEATHER_MAIN.to_string()
    } else {
        weather_main.to_string()
    }
}

pub fn to_hero_view(current: &CurrentConditions, unit: TemperatureUnit) -> HeroView {
    let name = current.name.as_deref().unwrap_or("");
    let country = current
        .sys
        .as_ref()
        .and_then(|s| s.country.as_deref())
        .unwrap_or("");
    let city_label = [name, country]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    let main = current.main.clone().unwrap_or_default();
    let condition = current.primary_condition().cloned().unwrap_or_default();

    HeroView {
        city_label,
        temperature_display: display_kelvin(main.temp, unit),
        feels_like_display: display_kelvin(main.feels_like, unit),
        condition: condition.description.unwrap_or_default(),
        weather_main: or_clear(condition.main.as_deref().unwrap_or("")),
    }
}

/// Stats grid rows: Current, High, Low, Humidity, Wind, Pressure.
pub fn to_stats_view(current: &CurrentConditions, unit: TemperatureUnit) -> Vec<StatItem> {
    let main = current.main.clone().unwrap_or_default();
    let wind = current.wind.clone().unwrap_or_default();

    let stat = |icon: &str, label: &str, value: String| StatItem {
        icon: icon.to_string(),
        label: label.to_string(),
        value,
        sublabel: None,
    };

    vec![
        stat("thermometer-half", "Current", display_kelvin(main.temp, unit)),
        stat("temperature-high", "High", display_kelvin(main.temp_max, unit)),
        stat("temperature-low", "Low", display_kelvin(main.temp_min, unit)),
        stat(
            "tint",
            "Humidity",
            format!("{}%", main.humidity.unwrap_or(0.0)),
        ),
        StatItem {
            sublabel: Some(wind_direction(wind.deg.unwrap_or(0.0)).to_string()),
            ..stat("wind", "Wind", format!("{} m/s", wind.speed.unwrap_or(0.0)))
        },
        stat(
            "compress-arrows-alt",
            "Pressure",
            format!("{} hPa", main.pressure.unwrap_or(0.0)),
        ),
    ]
}

/// Forecast table rows in `unit`.
///
/// Extremes are converted from the day's Kelvin readings, so rows match
/// what `aggregate_daily` produces directly in `unit`.
pub fn to_forecast_view(aggregates: &[DailyAggregate], unit: TemperatureUnit) -> Vec<ForecastRow> {
    aggregates
        .iter()
        .map(|day| {
            let max_temp = to_whole(kelvin_to_display(day.max_kelvin, unit));
            let min_temp = to_whole(kelvin_to_display(day.min_kelvin, unit));
            ForecastRow {
                date: day.date.clone(),
                max_temp,
                min_temp,
                max_display: format_temperature(max_temp, unit),
                min_display: format_temperature(min_temp, unit),
                description: day.dominant_description.clone(),
                weather_main: or_clear(&day.dominant_weather_main),
                wind_speed: day.avg_wind_speed,
                humidity: day.avg_humidity,
                precipitation_probability: day.max_precipitation_probability,
            }
        })
        .collect()
}

pub fn to_historical_view(points: &[HistoricalPoint], unit: TemperatureUnit) -> Vec<HistoricalRow> {
    points
        .iter()
        .map(|point| {
            let temperature = to_whole(kelvin_to_display(point.temperature_kelvin, unit));
            HistoricalRow {
                date: point.date.clone(),
                temperature,
                temperature_display: format_temperature(temperature, unit),
                weather_main: or_clear(&point.weather_main),
                description: point.description.clone(),
            }
        })
        .collect()
}

pub fn to_air_quality_view(reading: &PollutionReading) -> AirQualityView {
    let c = &reading.components;
    let components = [
        ("CO", c.co),
        ("NO", c.no),
        ("NO₂", c.no2),
        ("O₃", c.o3),
        ("SO₂", c.so2),
        ("PM2.5", c.pm2_5),
        ("PM10", c.pm10),
        ("NH₃", c.nh3),
    ]
    .into_iter()
    .map(|(name, value)| ComponentRow {
        name,
        value: format!("{:.2} µg/m³", value),
    })
    .collect();

    AirQualityView {
        aqi: reading.aqi,
        label: reading.label.clone(),
        color_tier: reading.color_tier,
        components,
    }
}

/// The first `limit` forecast readings in time order, local wall-clock.
pub fn to_air_quality_outlook(readings: &[PollutionReading], limit: usize) -> Vec<AirQualityOutlookRow> {
    to_air_quality_outlook_in(readings, limit, &Local)
}

pub fn to_air_quality_outlook_in<Tz: TimeZone>(
    readings: &[PollutionReading],
    limit: usize,
    tz: &Tz,
) -> Vec<AirQualityOutlookRow>
where
    Tz::Offset: std::fmt::Display,
{
    let mut ordered: Vec<&PollutionReading> = readings.iter().collect();
    ordered.sort_by_key(|r| r.timestamp);

    ordered
        .into_iter()
        .take(limit)
        .map(|r| AirQualityOutlookRow {
            date: epoch_to_date_string_in(r.timestamp, tz),
            time: epoch_to_hour_string_in(r.timestamp, tz),
            aqi: r.aqi,
            label: r.label.clone(),
            color_tier: r.color_tier,
        })
        .collect()
}
