//! Reduction of raw forecast samples into per-day and per-slot records.

use std::collections::BTreeMap;

use chrono::{Local, TimeZone};

use crate::types::{DailyAggregate, HourlyPoint, RawSample, TemperatureUnit};
use crate::units::{
    epoch_to_date_string_in, epoch_to_hour_string_in, kelvin_to_display, round_half_up, to_whole,
};

/// Group samples by local calendar day and reduce each day.
///
/// One aggregate is produced per distinct day present in `samples`, in
/// ascending date order. Temperatures are converted with `unit`.
pub fn aggregate_daily(samples: &[RawSample], unit: TemperatureUnit) -> Vec<DailyAggregate> {
    aggregate_daily_in(samples, unit, &Local)
}

pub fn aggregate_daily_in<Tz: TimeZone>(
    samples: &[RawSample],
    unit: TemperatureUnit,
    tz: &Tz,
) -> Vec<DailyAggregate>
where
    Tz::Offset: std::fmt::Display,
{
    // "YYYY/MM/DD" keys sort chronologically
    let mut days: BTreeMap<String, Vec<&RawSample>> = BTreeMap::new();
    for sample in samples {
        days.entry(epoch_to_date_string_in(sample.timestamp, tz))
            .or_default()
            .push(sample);
    }

    let aggregates: Vec<DailyAggregate> = days
        .into_iter()
        .map(|(date, mut group)| {
            group.sort_by_key(|s| s.timestamp);
            reduce_day(date, &group, unit)
        })
        .collect();

    tracing::debug!(
        "Aggregated {} samples into {} days",
        samples.len(),
        aggregates.len()
    );
    aggregates
}

/// Reduce one non-empty, timestamp-ordered group.
fn reduce_day(date: String, group: &[&RawSample], unit: TemperatureUnit) -> DailyAggregate {
    let count = group.len() as f64;

    // Non-finite readings are skipped; a day with none left reports NaN
    let (coldest, warmest) = group
        .iter()
        .map(|s| s.temperature_kelvin)
        .filter(|k| k.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, k| match acc {
            Some((lo, hi)) => Some((lo.min(k), hi.max(k))),
            None => Some((k, k)),
        })
        .unwrap_or((f64::NAN, f64::NAN));

    let humidity: f64 = group.iter().map(|s| s.humidity_percent).sum();
    let wind: f64 = group.iter().map(|s| s.wind_speed).sum();

    let max_pop = group
        .iter()
        .filter_map(|s| s.precipitation_probability)
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))));

    DailyAggregate {
        date,
        min_temp: to_whole(kelvin_to_display(coldest, unit)),
        max_temp: to_whole(kelvin_to_display(warmest, unit)),
        avg_humidity: to_whole(round_half_up(humidity / count)),
        avg_wind_speed: to_whole(round_half_up(wind / count)),
        dominant_description: dominant(group.iter().map(|s| s.weather_description.as_str())),
        dominant_weather_main: dominant(group.iter().map(|s| s.weather_main.as_str())),
        max_precipitation_probability: max_pop
            .map(|p| to_whole(round_half_up(p * 100.0)))
            .unwrap_or(0),
        unit,
        min_kelvin: coldest,
        max_kelvin: warmest,
    }
}

/// Most frequent value; on equal counts the value seen first wins.
fn dominant<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match tally.iter_mut().find(|(seen, _)| *seen == value) {
            Some(entry) => entry.1 += 1,
            None => tally.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in tally {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value.to_string()).unwrap_or_default()
}

/// The next `limit` forecast slots in timestamp order.
pub fn hourly_outlook(
    samples: &[RawSample],
    unit: TemperatureUnit,
    limit: usize,
) -> Vec<HourlyPoint> {
    hourly_outlook_in(samples, unit, limit, &Local)
}

pub fn hourly_outlook_in<Tz: TimeZone>(
    samples: &[RawSample],
    unit: TemperatureUnit,
    limit: usize,
    tz: &Tz,
) -> Vec<HourlyPoint>
where
    Tz::Offset: std::fmt::Display,
{
    let mut ordered: Vec<&RawSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    ordered
        .into_iter()
        .take(limit)
        .map(|s| HourlyPoint {
            date: epoch_to_date_string_in(s.timestamp, tz),
            time: epoch_to_hour_string_in(s.timestamp, tz),
            temperature: to_whole(kelvin_to_display(s.temperature_kelvin, unit)),
            weather_main: s.weather_main.clone(),
            precipitation_probability: s
                .precipitation_probability
                .map(|p| to_whole(round_half_up(p * 100.0)))
                .unwrap_or(0),
        })
        .collect()
}
