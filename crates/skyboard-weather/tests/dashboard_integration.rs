//! Integration tests for Dashboard against a mock OpenWeather server and
//! an in-process fake provider.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use skyboard_weather::history::lookup_epochs;
use skyboard_weather::{
    CollectingSink, ColorTier, CurrentConditions, Dashboard, DashboardSettings,
    OpenWeatherClient, OpenWeatherSettings, RawPollution, RawSample, Severity, TemperatureUnit,
    TracingSink, WeatherError, WeatherProvider,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOUR: i64 = 3600;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Forty three-hourly forecast entries starting now
fn forecast_body() -> serde_json::Value {
    let start = now();
    let list: Vec<serde_json::Value> = (0..40)
        .map(|i| {
            serde_json::json!({
                "dt": start + i * 3 * HOUR,
                "main": {"temp": 285.0 + (i % 8) as f64, "humidity": 60},
                "weather": [{"main": "Clouds", "description": "broken clouds"}],
                "wind": {"speed": 3.4},
                "pop": 0.2
            })
        })
        .collect();
    serde_json::json!({ "list": list })
}

/// Hourly pollution forecast entries starting now
fn pollution_forecast_body() -> serde_json::Value {
    let start = now();
    let list: Vec<serde_json::Value> = (0..24)
        .map(|i| {
            serde_json::json!({
                "dt": start + i * HOUR,
                "main": {"aqi": 1 + i % 5},
                "components": {"pm2_5": 3.0}
            })
        })
        .collect();
    serde_json::json!({ "list": list })
}

/// Formatted log output, shared with the subscriber that writes it.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn lines_containing(&self, needle: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

/// Route WARN and above on this thread into a buffer until the guard drops.
fn capture_warnings() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

async fn mount_happy_path(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Lisbon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "coord": {"lat": 38.72, "lon": -9.14},
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "main": {"temp": 295.15, "feels_like": 294.15, "temp_min": 293.15, "temp_max": 297.15,
                     "humidity": 55, "pressure": 1018},
            "wind": {"speed": 5.7, "deg": 315},
            "sys": {"country": "PT"},
            "name": "Lisbon"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/air_pollution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [{"dt": now(), "main": {"aqi": 2}, "components": {"pm2_5": 4.1, "pm10": 9.8}}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/air_pollution/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pollution_forecast_body()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/onecall/timemachine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{
                "dt": now() - 86_400,
                "temp": 291.15,
                "humidity": 60,
                "wind_speed": 2.0,
                "weather": [{"main": "Clouds", "description": "few clouds"}]
            }]
        })))
        .mount(server)
        .await;
}

fn openweather_dashboard(server: &MockServer, sink: Arc<CollectingSink>) -> Dashboard {
    let mut settings = OpenWeatherSettings::new("test_key");
    settings.base_url = server.uri();
    settings.onecall_url = server.uri();
    let provider = Arc::new(OpenWeatherClient::new(settings).unwrap());
    Dashboard::new(provider, sink, DashboardSettings::default())
}

#[tokio::test]
async fn test_full_load_and_render() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let sink = Arc::new(CollectingSink::new());
    let dashboard = openweather_dashboard(&server, sink.clone());

    let data = dashboard
        .load("Lisbon", &CancellationToken::new())
        .await
        .unwrap();
    let view = dashboard.render(&data);

    assert_eq!(view.hero.city_label, "Lisbon, PT");
    assert_eq!(view.hero.temperature_display, "22°C");
    assert_eq!(view.stats[4].sublabel.as_deref(), Some("NW"));

    // 40 samples over five days touch five or six local calendar days
    assert!((5..=6).contains(&view.daily.len()), "{} days", view.daily.len());
    let dates: Vec<&str> = view.daily.iter().map(|d| d.date.as_str()).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert!(view.daily.iter().all(|d| d.min_temp <= d.max_temp));
    assert!(view.daily.iter().all(|d| d.precipitation_probability == 20));

    assert_eq!(view.hourly.len(), 8);
    let air = view.air_quality.as_ref().unwrap();
    assert_eq!(air.label, "Fair");

    assert_eq!(view.air_quality_outlook.len(), 8);
    assert_eq!(view.air_quality_outlook[0].label, "Good");
    assert_eq!(view.air_quality_outlook[4].color_tier, ColorTier::Negative);

    assert_eq!(view.history.len(), 5);
    assert_eq!(view.history[0].temperature_display, "18°C");
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_partial_history_failure_still_renders() {
    let server = MockServer::start().await;
    let epochs = lookup_epochs(5);
    for epoch in [epochs[1], epochs[3]] {
        Mock::given(method("GET"))
            .and(path("/onecall/timemachine"))
            .and(query_param("dt", epoch.to_string()))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "cod": 500,
                "message": "Internal error"
            })))
            .with_priority(1)
            .mount(&server)
            .await;
    }
    mount_happy_path(&server).await;

    let sink = Arc::new(CollectingSink::new());
    let dashboard = openweather_dashboard(&server, sink.clone());

    let data = dashboard
        .load("Lisbon", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(data.history.points.len(), 3);
    assert_eq!(data.history.failed, 2);
    let notes = sink.drain();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n.message.ends_with("Internal error")));

    let view = dashboard.render(&data);
    assert_eq!(view.history.len(), 3);
    assert_eq!(view.history_failed, 2);
}

#[tokio::test]
async fn test_unknown_city_is_rejected_and_notified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let sink = Arc::new(CollectingSink::new());
    let dashboard = openweather_dashboard(&server, sink.clone());

    let result = dashboard.load("Nowhere", &CancellationToken::new()).await;

    assert!(matches!(result, Err(WeatherError::Api { status: 404, .. })));
    let notes = sink.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Negative);
    assert_eq!(notes[0].message, "Failed to get weather: city not found");
}

/// Provider whose forecast and pollution endpoints are down.
struct DegradedProvider;

#[async_trait]
impl WeatherProvider for DegradedProvider {
    async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        Ok(serde_json::from_value(serde_json::json!({
            "name": city,
            "coord": {"lat": 1.0, "lon": 2.0},
            "main": {"temp": 273.15}
        }))
        .unwrap())
    }

    async fn fetch_forecast_window(
        &self,
        _lat: f64,
        _lon: f64,
    ) -> Result<Vec<RawSample>, WeatherError> {
        Err(WeatherError::Api {
            status: 503,
            message: "forecast unavailable".into(),
        })
    }

    async fn fetch_historical_point(
        &self,
        _lat: f64,
        _lon: f64,
        epoch: i64,
    ) -> Result<RawSample, WeatherError> {
        Ok(RawSample {
            timestamp: epoch,
            temperature_kelvin: 273.15,
            humidity_percent: 90.0,
            wind_speed: 1.0,
            weather_main: "Snow".into(),
            weather_description: "light snow".into(),
            precipitation_probability: None,
        })
    }

    async fn fetch_pollution(&self, _lat: f64, _lon: f64) -> Result<RawPollution, WeatherError> {
        Err(WeatherError::Api {
            status: 503,
            message: String::new(),
        })
    }

    async fn fetch_pollution_forecast(
        &self,
        _lat: f64,
        _lon: f64,
    ) -> Result<Vec<RawPollution>, WeatherError> {
        Ok(vec![RawPollution {
            timestamp: 0,
            aqi: 7,
            components: Default::default(),
        }])
    }
}

#[tokio::test]
async fn test_section_failures_leave_sections_empty() {
    let sink = Arc::new(CollectingSink::new());
    let settings = DashboardSettings {
        history_days: 2,
        ..Default::default()
    };
    let dashboard = Dashboard::new(Arc::new(DegradedProvider), sink.clone(), settings);

    let data = dashboard.load("Oslo", &CancellationToken::new()).await.unwrap();
    assert!(data.forecast.is_none());
    assert!(data.pollution.is_none());
    assert_eq!(data.history.points.len(), 2);

    let mut messages: Vec<String> = sink.drain().into_iter().map(|n| n.message).collect();
    messages.sort();
    assert_eq!(
        messages,
        vec![
            "Failed to get air pollution".to_string(),
            "Failed to get forecast weather: forecast unavailable".to_string(),
        ]
    );

    let view = dashboard.render(&data);
    assert!(view.daily.is_empty());
    assert!(view.hourly.is_empty());
    assert!(view.air_quality.is_none());
    assert_eq!(view.air_quality_outlook.len(), 1);
    assert_eq!(view.air_quality_outlook[0].label, "Unknown");
    assert_eq!(view.hero.temperature_display, "0°C");
}

#[tokio::test]
async fn test_unit_change_rerenders_without_reload() {
    let sink = Arc::new(CollectingSink::new());
    let mut dashboard = Dashboard::new(
        Arc::new(DegradedProvider),
        sink,
        DashboardSettings {
            history_days: 1,
            ..Default::default()
        },
    );
    let data = dashboard.load("Oslo", &CancellationToken::new()).await.unwrap();

    let celsius = dashboard.render(&data);
    dashboard.set_unit(TemperatureUnit::Fahrenheit);
    let fahrenheit = dashboard.render(&data);

    assert_eq!(celsius.history[0].temperature_display, "0°C");
    assert_eq!(fahrenheit.history[0].temperature_display, "32°F");
    assert_eq!(fahrenheit.hero.temperature_display, "32°F");
    assert_eq!(fahrenheit.unit, TemperatureUnit::Fahrenheit);
}

#[tokio::test]
async fn test_cancelled_before_fan_out() {
    let sink = Arc::new(CollectingSink::new());
    let dashboard = Dashboard::new(Arc::new(DegradedProvider), sink.clone(), DashboardSettings::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = dashboard.load("Oslo", &cancel).await;
    assert!(matches!(result, Err(WeatherError::Cancelled)));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_pollution_forecast_unknown_index() {
    let sink = Arc::new(CollectingSink::new());
    let dashboard = Dashboard::new(Arc::new(DegradedProvider), sink, DashboardSettings::default());

    let readings = dashboard.load_pollution_forecast(1.0, 2.0).await.unwrap();
    assert_eq!(readings[0].label, "Unknown");
    assert_eq!(readings[0].color_tier, ColorTier::Grey);
}

#[tokio::test]
async fn test_pollution_forecast_failure_is_notified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/air_pollution/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "cod": 500,
            "message": "Internal error"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_happy_path(&server).await;

    let sink = Arc::new(CollectingSink::new());
    let dashboard = openweather_dashboard(&server, sink.clone());

    let data = dashboard
        .load("Lisbon", &CancellationToken::new())
        .await
        .unwrap();
    assert!(data.pollution_forecast.is_none());
    assert!(data.pollution.is_some());

    let notes = sink.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(
        notes[0].message,
        "Failed to get air pollution forecast: Internal error"
    );
    assert!(dashboard.render(&data).air_quality_outlook.is_empty());
}

#[tokio::test]
async fn test_section_failures_are_logged_once() {
    let (logs, _guard) = capture_warnings();
    let settings = DashboardSettings {
        history_days: 1,
        ..Default::default()
    };
    let dashboard = Dashboard::new(Arc::new(DegradedProvider), Arc::new(TracingSink), settings);

    dashboard.load("Oslo", &CancellationToken::new()).await.unwrap();

    assert_eq!(logs.lines_containing("Failed to get forecast weather"), 1);
    assert_eq!(logs.lines_containing("forecast unavailable"), 1);
    assert_eq!(logs.lines_containing("Failed to get air pollution"), 1);
}

#[tokio::test]
async fn test_history_failures_are_logged_once() {
    let server = MockServer::start().await;
    let epochs = lookup_epochs(3);
    Mock::given(method("GET"))
        .and(path("/onecall/timemachine"))
        .and(query_param("dt", epochs[0].to_string()))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "cod": 500,
            "message": "Internal error"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_happy_path(&server).await;

    let (logs, _guard) = capture_warnings();
    let mut settings = OpenWeatherSettings::new("test_key");
    settings.base_url = server.uri();
    settings.onecall_url = server.uri();
    let dashboard = Dashboard::new(
        Arc::new(OpenWeatherClient::new(settings).unwrap()),
        Arc::new(TracingSink),
        DashboardSettings {
            history_days: 3,
            ..Default::default()
        },
    );

    let data = dashboard
        .load("Lisbon", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(data.history.failed, 1);
    assert_eq!(logs.lines_containing("Internal error"), 1);
    assert_eq!(logs.lines_containing("Failed to get historical weather for"), 1);
}
