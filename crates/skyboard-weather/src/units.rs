//! Temperature conversion and epoch formatting.
//!
//! Conversions take the target unit as an argument; nothing here reads
//! ambient state. Date helpers default to the local calendar, with `_in`
//! variants for an explicit time zone.

use chrono::{DateTime, Duration, Local, TimeZone};

use crate::types::TemperatureUnit;

const KELVIN_OFFSET: f64 = 273.15;

/// Round to the nearest integer, resolving `.5` toward positive infinity.
///
/// `2.5 -> 3`, `-2.5 -> -2`. NaN stays NaN.
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Convert Kelvin to the display unit, rounded half-up.
///
/// The result is a whole number. A non-finite input propagates (NaN in, NaN
/// out); it is not trapped here.
pub fn kelvin_to_display(kelvin: f64, unit: TemperatureUnit) -> f64 {
    celsius_to_display(kelvin - KELVIN_OFFSET, unit)
}

/// Convert Celsius to the display unit, rounded half-up.
pub fn celsius_to_display(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => round_half_up(celsius),
        TemperatureUnit::Fahrenheit => round_half_up(celsius * 9.0 / 5.0 + 32.0),
    }
}

/// Whole-number display value as an integer. NaN maps to 0.
pub fn to_whole(value: f64) -> i64 {
    value as i64
}

/// "21°C" / "70°F"
pub fn format_temperature(value: i64, unit: TemperatureUnit) -> String {
    format!("{}{}", value, unit.symbol())
}

/// Local calendar day of `epoch` as "YYYY/MM/DD".
pub fn epoch_to_date_string(epoch: i64) -> String {
    epoch_to_date_string_in(epoch, &Local)
}

/// Local wall-clock time of `epoch` as "HH:MM".
pub fn epoch_to_hour_string(epoch: i64) -> String {
    epoch_to_hour_string_in(epoch, &Local)
}

pub fn epoch_to_date_string_in<Tz: TimeZone>(epoch: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_epoch(epoch, tz, "%Y/%m/%d")
}

pub fn epoch_to_hour_string_in<Tz: TimeZone>(epoch: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_epoch(epoch, tz, "%H:%M")
}

fn format_epoch<Tz: TimeZone>(epoch: i64, tz: &Tz, pattern: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_opt(epoch, 0).single() {
        Some(dt) => dt.format(pattern).to_string(),
        None => {
            tracing::warn!("Epoch {} is outside the representable range", epoch);
            String::new()
        }
    }
}

/// Epoch of local midnight `days_from_now` calendar days from today.
///
/// Negative values go into the past: `offset_epoch(-1)` is the start of
/// yesterday.
pub fn offset_epoch(days_from_now: i64) -> i64 {
    offset_epoch_from(Local::now(), days_from_now)
}

pub fn offset_epoch_from<Tz: TimeZone>(now: DateTime<Tz>, days_from_now: i64) -> i64 {
    let tz = now.timezone();
    let Some(day) = now
        .date_naive()
        .checked_add_signed(Duration::days(days_from_now))
    else {
        return now.timestamp();
    };
    let Some(midnight) = day.and_hms_opt(0, 0, 0) else {
        return now.timestamp();
    };

    // A DST gap can swallow midnight; fall back to reading it as UTC
    match tz.from_local_datetime(&midnight).earliest() {
        Some(start) => start.timestamp(),
        None => midnight.and_utc().timestamp(),
    }
}
