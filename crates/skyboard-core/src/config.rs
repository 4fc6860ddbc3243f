use serde::{Deserialize, Serialize};
use skyboard_weather::geocode::DEFAULT_LOCATIONIQ_URL;
use skyboard_weather::openweather::{DEFAULT_BASE_URL, DEFAULT_ONECALL_URL};
use skyboard_weather::{DashboardSettings, OpenWeatherSettings, TemperatureUnit};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{AppError, ConfigError};

/// Environment variable holding the OpenWeather API key
pub const OPENWEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";
/// Environment variable holding the LocationIQ access token
pub const LOCATIONIQ_TOKEN_VAR: &str = "LOCATIONIQ_TOKEN";

const APP_DIR: &str = "skyboard";
const CONFIG_FILE: &str = "config.toml";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined with "; "
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Dashboard behaviour
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Upstream endpoints
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub temperature_unit: TemperatureUnit,

    /// Past days shown in the history section
    pub history_days: u32,

    /// Upper bound on concurrent history lookups
    pub max_in_flight: usize,

    /// Forecast slots in the hourly outlook
    pub forecast_hours: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        let settings = DashboardSettings::default();
        Self {
            temperature_unit: settings.unit,
            history_days: settings.history_days,
            max_in_flight: settings.max_in_flight,
            forecast_hours: settings.forecast_hours,
        }
    }
}

impl WeatherConfig {
    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            unit: self.temperature_unit,
            history_days: self.history_days,
            max_in_flight: self.max_in_flight,
            forecast_hours: self.forecast_hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub openweather_url: String,
    pub onecall_url: String,
    pub locationiq_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openweather_url: DEFAULT_BASE_URL.to_string(),
            onecall_url: DEFAULT_ONECALL_URL.to_string(),
            locationiq_url: DEFAULT_LOCATIONIQ_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl ProviderConfig {
    pub fn openweather_settings(&self, api_key: &str) -> OpenWeatherSettings {
        let mut settings = OpenWeatherSettings::new(api_key);
        settings.base_url = self.openweather_url.trim_end_matches('/').to_string();
        settings.onecall_url = self.onecall_url.trim_end_matches('/').to_string();
        settings.timeout = Duration::from_secs(self.timeout_secs);
        settings
    }
}

/// Credentials read from the environment. Never written to the config file.
#[derive(Clone, Default)]
pub struct Secrets {
    pub openweather_api_key: Option<String>,
    pub locationiq_token: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            openweather_api_key: non_empty_var(OPENWEATHER_KEY_VAR),
            locationiq_token: non_empty_var(LOCATIONIQ_TOKEN_VAR),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Secrets")
            .field("openweather_api_key", &redact(&self.openweather_api_key))
            .field("locationiq_token", &redact(&self.locationiq_token))
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating it with
    /// defaults if it doesn't exist
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Validate the config as it will be used.
    ///
    /// Warnings are logged; errors fail with [`ConfigError::Invalid`].
    pub fn ensure_valid(&self) -> Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.provider.openweather_url,
            "provider.openweather_url",
            &mut result,
        );
        self.validate_url(&self.provider.onecall_url, "provider.onecall_url", &mut result);
        self.validate_url(
            &self.provider.locationiq_url,
            "provider.locationiq_url",
            &mut result,
        );

        if self.provider.timeout_secs == 0 {
            result.add_error("provider.timeout_secs", "Timeout must be greater than 0");
        }

        if self.weather.history_days == 0 {
            result.add_warning("weather.history_days", "History disabled (0 days)");
        } else if self.weather.history_days > 30 {
            result.add_warning(
                "weather.history_days",
                "More than 30 history days means many upstream requests",
            );
        }

        if self.weather.max_in_flight == 0 {
            result.add_error(
                "weather.max_in_flight",
                "At least one concurrent lookup is required",
            );
        }

        if self.weather.forecast_hours == 0 {
            result.add_warning("weather.forecast_hours", "Hourly outlook disabled (0 slots)");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Invalid("no user config directory".to_string()))?
            .join(APP_DIR);

        Ok(config_dir.join(CONFIG_FILE))
    }
}
