//! Weather records produced by the weather step.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Raw reading from the weather source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub location: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Degrees Celsius
    pub feels_like: f64,
    /// Percent
    pub humidity: u8,
    /// km/h
    pub wind_speed: f64,
    pub description: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub observed_at: DateTime<Utc>,
}

impl WeatherReading {
    /// One-line summary used in prompts and degraded replies
    pub fn summary(&self) -> String {
        format!(
            "{}: {}, {:.1}°C (feels like {:.1}°C), humidity {}%, wind {:.1} km/h",
            self.location,
            self.description,
            self.temperature,
            self.feels_like,
            self.humidity,
            self.wind_speed
        )
    }

    /// Lowercased words describing the conditions, for matching item tags
    pub fn condition_terms(&self) -> Vec<String> {
        self.conditions
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.description.as_str()))
            .flat_map(|s| s.split_whitespace())
            .map(|w| w.to_lowercase())
            .collect()
    }
}

/// Qualitative interpretation of a reading by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeatherAnalysis {
    pub weather_analysis: String,
    /// 1 (uncomfortable) to 5 (pleasant)
    pub comfort_level: u8,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub recommendations: String,
}

/// What the weather step contributes to the turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    #[serde(flatten)]
    pub reading: WeatherReading,
    /// Absent when enrichment failed; the raw reading is used instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<WeatherAnalysis>,
}

impl WeatherData {
    pub fn raw(reading: WeatherReading) -> Self {
        Self {
            reading,
            analysis: None,
        }
    }
}
