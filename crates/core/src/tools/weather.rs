//! # OpenWeatherMap Client
//!
//! Geocodes a location, then reads current conditions. When geocoding
//! yields nothing, a small table of well-known cities is consulted.

use crate::error::{StepError, StepResult};
use crate::state::WeatherReading;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;

use super::WeatherSource;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Coordinates used when geocoding is unavailable
const DEMO_COORDINATES: &[(&str, f64, f64)] = &[
    ("new york", 40.7128, -74.0060),
    ("london", 51.5074, -0.1278),
    ("paris", 48.8566, 2.3522),
    ("tokyo", 35.6762, 139.6503),
    ("sydney", -33.8688, 151.2093),
    ("leuven", 50.8798, 4.7005),
    ("greenland", 72.0, -40.0),
];

/// Look up a demo city (case and whitespace insensitive)
pub fn demo_coordinates(location: &str) -> Option<(f64, f64)> {
    let key = location.trim().to_lowercase();
    DEMO_COORDINATES
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|(_, lat, lon)| (*lat, *lon))
}

fn kelvin_to_celsius(k: f64) -> f64 {
    round1(k - 273.15)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Convert a `data/2.5/weather` payload (standard units) into a reading
pub fn parse_current_weather(location: &str, payload: &Value) -> StepResult<WeatherReading> {
    let main = payload
        .get("main")
        .ok_or_else(|| StepError::lookup("weather payload missing 'main'"))?;
    let number = |v: &Value, key: &str| {
        v.get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| StepError::lookup(format!("weather payload missing '{}'", key)))
    };

    let temp_k = number(main, "temp")?;
    let feels_k = number(main, "feels_like")?;
    let humidity = number(main, "humidity")?;
    let wind = payload
        .get("wind")
        .and_then(|w| w.get("speed"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let first = payload
        .get("weather")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .ok_or_else(|| StepError::lookup("weather payload missing 'weather'"))?;
    let description = first
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let conditions = first
        .get("main")
        .and_then(Value::as_str)
        .map(|m| vec![m.to_string()])
        .unwrap_or_default();

    Ok(WeatherReading {
        location: location.to_string(),
        temperature: kelvin_to_celsius(temp_k),
        feels_like: kelvin_to_celsius(feels_k),
        humidity: humidity.clamp(0.0, 100.0) as u8,
        wind_speed: round1(wind * 3.6),
        description,
        conditions,
        observed_at: Utc::now(),
    })
}

/// HTTP weather source backed by OpenWeatherMap
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("stylist/0.1")
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn geocode(&self, location: &str, api_key: &str) -> Option<(f64, f64)> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", location), ("limit", "1"), ("appid", api_key)])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), location, "Geocoding failed");
            return None;
        }

        let json: Value = response.json().await.ok()?;
        let first = json.as_array()?.first()?;
        Some((first.get("lat")?.as_f64()?, first.get("lon")?.as_f64()?))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, location: &str) -> StepResult<WeatherReading> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| StepError::lookup("WEATHER_API_KEY is not configured"))?;

        let (lat, lon) = match self.geocode(location, api_key).await {
            Some(coords) => coords,
            None => demo_coordinates(location).ok_or_else(|| {
                StepError::lookup(format!("could not find coordinates for '{}'", location))
            })?,
        };

        let url = format!("{}/data/2.5/weather", self.base_url);
        let (lat, lon) = (lat.to_string(), lon.to_string());
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "standard"),
            ])
            .send()
            .await
            .map_err(|e| StepError::lookup(format!("weather request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StepError::lookup(format!("weather API error: {} - {}", status, body)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| StepError::lookup(format!("weather response unreadable: {}", e)))?;

        let reading = parse_current_weather(location, &payload)?;
        tracing::debug!(location, temperature = reading.temperature, "Fetched weather");
        Ok(reading)
    }
}
