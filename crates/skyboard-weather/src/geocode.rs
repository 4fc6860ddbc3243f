//! Place lookup via LocationIQ: reverse geocoding and autocomplete.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const DEFAULT_LOCATIONIQ_URL: &str = "https://api.locationiq.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const AUTOCOMPLETE_LIMIT: &str = "5";

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Geocoding error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    /// ISO 3166 alpha-2, upper case
    pub country_code: Option<String>,
    /// Human-readable label, e.g. "Seattle, Washington"
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    /// City query accepted by the weather provider ("Seattle,US")
    pub fn query(&self) -> String {
        match &self.country_code {
            Some(cc) => format!("{},{}", self.name, cc),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LiqAddress {
    name: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LiqPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_place: Option<String>,
    #[serde(default)]
    address: LiqAddress,
}

#[derive(Debug, Deserialize)]
struct LiqError {
    error: Option<String>,
}

fn to_place(raw: LiqPlace) -> Option<Place> {
    let lat = raw.lat.parse::<f64>().ok()?;
    let lon = raw.lon.parse::<f64>().ok()?;
    let addr = raw.address;

    // Capture state/country before the place chain consumes them
    let state = addr.state.clone();
    let country = addr.country.clone();

    let name = addr
        .name
        .or(addr.city)
        .or(addr.town)
        .or(addr.village)
        .or(addr.municipality)
        .or(raw.display_place)
        .or(addr.county)
        .or(addr.state)
        .or(addr.country)?;

    let suffix = state
        .filter(|s| !s.is_empty() && *s != name)
        .or_else(|| country.filter(|c| !c.is_empty() && *c != name));

    let label = match suffix {
        Some(s) => format!("{}, {}", name, s),
        None => name.clone(),
    };

    Some(Place {
        name,
        country_code: addr
            .country_code
            .filter(|cc| !cc.is_empty())
            .map(|cc| cc.to_uppercase()),
        label,
        lat,
        lon,
    })
}

pub struct LocationIqClient {
    client: Client,
    token: String,
    base_url: String,
}

impl LocationIqClient {
    pub fn new(token: &str, base_url: &str) -> Result<Self, GeocodeError> {
        if token.trim().is_empty() {
            return Err(GeocodeError::Configuration(
                "LocationIQ token is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve coordinates to a place.
    /// Returns `None` on failure; the caller can fall back to coordinates.
    #[instrument(skip(self), level = "info")]
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Option<Place> {
        let url = format!("{}/reverse", self.base_url);
        let query = [
            ("key", self.token.clone()),
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("format", "json".to_string()),
        ];

        let raw: LiqPlace = match self.get_json(&url, &query).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Reverse geocode failed: {}", e);
                return None;
            }
        };

        let place = to_place(raw)?;
        tracing::info!("Reverse geocoded to: {}", place.label);
        Some(place)
    }

    /// Up to five place suggestions for a partial query.
    #[instrument(skip(self), level = "info")]
    pub async fn autocomplete(&self, text: &str) -> Result<Vec<Place>, GeocodeError> {
        let url = format!("{}/autocomplete", self.base_url);
        let query = [
            ("key", self.token.clone()),
            ("q", text.to_string()),
            ("limit", AUTOCOMPLETE_LIMIT.to_string()),
        ];

        let raw: Vec<LiqPlace> = self.get_json(&url, &query).await?;
        Ok(raw.into_iter().filter_map(to_place).collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, GeocodeError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| GeocodeError::Parse(format!("JSON parse error: {}", e)));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<LiqError>(&text)
            .ok()
            .and_then(|body| body.error)
            .unwrap_or(text);
        Err(GeocodeError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
