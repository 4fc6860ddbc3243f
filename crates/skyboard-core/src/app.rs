use std::sync::Arc;

use serde::Serialize;
use skyboard_weather::{
    Dashboard, DashboardView, LocationIqClient, NotificationSink, OpenWeatherClient, Place,
    TemperatureUnit, TracingSink,
};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, Secrets, LOCATIONIQ_TOKEN_VAR, OPENWEATHER_KEY_VAR};
use crate::error::{AppError, ConfigError};

/// A place resolved from coordinates together with its dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedDashboard {
    pub place: Place,
    pub view: DashboardView,
}

/// Main application state: config plus the wired-up clients.
pub struct App {
    config: Arc<Config>,
    dashboard: Dashboard,
    geocoder: Option<LocationIqClient>,
}

impl App {
    /// Build the application with notifications going to the log.
    pub fn new(config: Config, secrets: Secrets) -> Result<Self, AppError> {
        Self::with_sink(config, secrets, Arc::new(TracingSink))
    }

    pub fn with_sink(
        config: Config,
        secrets: Secrets,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, AppError> {
        let api_key = secrets
            .openweather_api_key
            .ok_or_else(|| ConfigError::MissingSetting(OPENWEATHER_KEY_VAR.to_string()))?;

        let provider = OpenWeatherClient::new(config.provider.openweather_settings(&api_key))?;
        let dashboard = Dashboard::new(
            Arc::new(provider),
            sink,
            config.weather.dashboard_settings(),
        );

        let geocoder = match secrets.locationiq_token {
            Some(token) => Some(LocationIqClient::new(&token, &config.provider.locationiq_url)?),
            None => {
                tracing::debug!("{} not set, place lookup disabled", LOCATIONIQ_TOKEN_VAR);
                None
            }
        };

        tracing::info!(
            "Application initialized (unit: {}, history days: {})",
            config.weather.temperature_unit,
            config.weather.history_days
        );

        Ok(Self {
            config: Arc::new(config),
            dashboard,
            geocoder,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.dashboard.set_unit(unit);
    }

    /// Load and render the dashboard for a city query ("London" or "London,GB").
    pub async fn show(
        &self,
        city: &str,
        cancel: &CancellationToken,
    ) -> Result<DashboardView, AppError> {
        let data = self.dashboard.load(city, cancel).await?;
        Ok(self.dashboard.render(&data))
    }

    /// Reverse-geocode the coordinates, then show the dashboard for that place.
    pub async fn locate(
        &self,
        lat: f64,
        lon: f64,
        cancel: &CancellationToken,
    ) -> Result<LocatedDashboard, AppError> {
        let place = self
            .geocoder()?
            .reverse_geocode(lat, lon)
            .await
            .ok_or(AppError::LocationNotFound { lat, lon })?;

        let view = self.show(&place.query(), cancel).await?;
        Ok(LocatedDashboard { place, view })
    }

    pub async fn suggest(&self, query: &str) -> Result<Vec<Place>, AppError> {
        let places = self.geocoder()?.autocomplete(query).await?;
        tracing::debug!("{} suggestions for {:?}", places.len(), query);
        Ok(places)
    }

    fn geocoder(&self) -> Result<&LocationIqClient, AppError> {
        self.geocoder
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSetting(LOCATIONIQ_TOKEN_VAR.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyboard_weather::CollectingSink;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.provider.openweather_url = server.uri();
        config.provider.onecall_url = server.uri();
        config.provider.locationiq_url = server.uri();
        config.weather.history_days = 0;
        config
    }

    fn secrets() -> Secrets {
        Secrets {
            openweather_api_key: Some("ow-key".into()),
            locationiq_token: Some("liq-token".into()),
        }
    }

    async fn mount_weather(server: &MockServer, query: &str) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "coord": {"lat": 51.51, "lon": -0.13},
                "weather": [{"main": "Rain", "description": "light rain"}],
                "main": {"temp": 283.15, "humidity": 80, "pressure": 1009},
                "wind": {"speed": 4.0, "deg": 180},
                "sys": {"country": "GB"},
                "name": "London"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"list": []})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/air_pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{"dt": 0, "main": {"aqi": 1}, "components": {}}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/air_pollution/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [
                    {"dt": 1_717_203_600, "main": {"aqi": 3}, "components": {}},
                    {"dt": 1_717_200_000, "main": {"aqi": 2}, "components": {}}
                ]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_missing_openweather_key() {
        let result = App::new(Config::default(), Secrets::default());
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::MissingSetting(ref name))) if name == OPENWEATHER_KEY_VAR
        ));
    }

    #[tokio::test]
    async fn test_show_renders_view() {
        let server = MockServer::start().await;
        mount_weather(&server, "London").await;

        let sink = Arc::new(CollectingSink::new());
        let mut app = App::with_sink(config_for(&server), secrets(), sink.clone()).unwrap();
        app.set_unit(TemperatureUnit::Fahrenheit);

        let view = app.show("London", &CancellationToken::new()).await.unwrap();
        assert_eq!(view.hero.city_label, "London, GB");
        assert_eq!(view.hero.temperature_display, "50°F");
        assert!(view.daily.is_empty());
        assert_eq!(view.air_quality.map(|a| a.label), Some("Good".to_string()));
        let outlook: Vec<&str> = view
            .air_quality_outlook
            .iter()
            .map(|row| row.label.as_str())
            .collect();
        assert_eq!(outlook, vec!["Fair", "Moderate"]);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_locate_uses_place_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lat": "51.5073",
                "lon": "-0.1276",
                "address": {"city": "London", "country": "United Kingdom", "country_code": "gb"}
            })))
            .mount(&server)
            .await;
        mount_weather(&server, "London,GB").await;

        let app = App::with_sink(
            config_for(&server),
            secrets(),
            Arc::new(CollectingSink::new()),
        )
        .unwrap();

        let located = app
            .locate(51.5073, -0.1276, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(located.place.label, "London, United Kingdom");
        assert_eq!(located.view.hero.city_label, "London, GB");
    }

    #[tokio::test]
    async fn test_locate_without_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Unable to geocode"
            })))
            .mount(&server)
            .await;

        let app = App::new(config_for(&server), secrets()).unwrap();
        let result = app.locate(0.0, 0.0, &CancellationToken::new()).await;
        assert!(matches!(result, Err(AppError::LocationNotFound { .. })));
    }

    #[tokio::test]
    async fn test_suggest_requires_token() {
        let server = MockServer::start().await;
        let secrets = Secrets {
            openweather_api_key: Some("ow-key".into()),
            locationiq_token: None,
        };

        let app = App::new(config_for(&server), secrets).unwrap();
        let result = app.suggest("Par").await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::MissingSetting(_)))
        ));
    }
}
