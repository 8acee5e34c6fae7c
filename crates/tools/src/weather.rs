//! Current-weather tool backed by Open-Meteo.
//!
//! Two upstream calls: a geocoding lookup (skipped when the location is
//! already a "lat,lon" pair, and cached since coordinates don't move) and
//! the forecast endpoint. Soft failures (blank input, geocoding miss) come
//! back as explanatory text; transport and status failures are hard errors.

use crate::cache::TtlCache;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use switchboard_config::WeatherConfig;
use switchboard_core::error::ToolError;
use switchboard_core::tool::{InputSchema, Tool, ToolInput};
use tracing::debug;

const GEOCODE_CACHE_TTL: Duration = Duration::from_secs(3600);

pub struct WeatherTool {
    client: reqwest::Client,
    geocode_url: String,
    forecast_url: String,
    geocode_cache: TtlCache<(f64, f64)>,
}

impl WeatherTool {
    pub fn new(config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            geocode_url: config.geocode_url.clone(),
            forecast_url: config.forecast_url.clone(),
            geocode_cache: TtlCache::new(GEOCODE_CACHE_TTL),
        }
    }

    /// Accepts "lat,lon" with two finite floats, e.g. "48.85, 2.35".
    fn parse_coords(location: &str) -> Option<(f64, f64)> {
        let (lat, lon) = location.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
    }

    fn hard_failure(reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: "get_weather".into(),
            reason: reason.into(),
        }
    }

    /// Resolve a place name to coordinates. `Ok(None)` means the geocoder
    /// had no match, which is a soft failure for the caller to phrase.
    async fn geocode(&self, location: &str) -> Result<Option<(f64, f64)>, ToolError> {
        let cache_key = location.to_lowercase();
        if let Some(coords) = self.geocode_cache.get(&cache_key) {
            debug!(location, "Geocode cache hit");
            return Ok(Some(coords));
        }

        let response = self
            .client
            .get(&self.geocode_url)
            .query(&[("name", location), ("count", "1")])
            .send()
            .await
            .map_err(|e| Self::hard_failure(format!("geocoding request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::hard_failure(format!(
                "geocoding API returned {}",
                response.status()
            )));
        }

        let payload: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| Self::hard_failure(format!("bad geocoding payload: {e}")))?;

        let Some(hit) = payload.results.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        let coords = (hit.latitude, hit.longitude);
        self.geocode_cache.set(cache_key, coords);
        Ok(Some(coords))
    }

    async fn current_weather(&self, lat: f64, lon: f64) -> Result<Option<CurrentWeather>, ToolError> {
        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Self::hard_failure(format!("forecast request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::hard_failure(format!(
                "forecast API returned {}",
                response.status()
            )));
        }

        let payload: ForecastResponse = response
            .json()
            .await
            .map_err(|e| Self::hard_failure(format!("bad forecast payload: {e}")))?;

        Ok(payload.current_weather)
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather for a location using Open-Meteo (no API key)."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::from([(
            "location".to_string(),
            "city name or 'lat,lon'".to_string(),
        )])
    }

    async fn run(&self, input: &ToolInput) -> Result<String, ToolError> {
        let location = input
            .get("location")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if location.is_empty() {
            return Ok("Please provide a location.".into());
        }

        let (lat, lon) = match Self::parse_coords(location) {
            Some(coords) => coords,
            None => match self.geocode(location).await? {
                Some(coords) => coords,
                None => return Ok(format!("Couldn't geocode '{location}'.")),
            },
        };

        let Some(weather) = self.current_weather(lat, lon).await? else {
            return Ok(format!("No current weather data for '{location}'."));
        };

        Ok(format!(
            "Current weather at {location}: {}\u{b0}C, wind {} km/h.",
            weather.temperature, weather.windspeed
        ))
    }
}

// --- Open-Meteo payloads ---

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Option<Vec<GeocodeHit>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
}
