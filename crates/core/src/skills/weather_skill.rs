//! # Weather Skill
//!
//! Fetches the current reading for the turn's location and asks the
//! language model for a clothing-oriented interpretation. A failed
//! interpretation is not fatal: the raw reading is used on its own.

use crate::error::{StepError, StepResult};
use crate::state::{WeatherAnalysis, WeatherData, WeatherReading};
use crate::tools::{bounded, WeatherSource};
use std::sync::Arc;
use std::time::Duration;

use super::language_model::{LanguageModel, ResponseContract, ResponseShape};
use super::llm_helpers::decode_json;
use super::prompts;

pub const CONTRACT: ResponseContract = ResponseContract {
    name: "weather_analysis",
    system_prompt: prompts::WEATHER,
    shape: ResponseShape::Json,
};

/// Weather data plus the enrichment failure, if one occurred
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherOutcome {
    pub data: WeatherData,
    pub enrichment_error: Option<StepError>,
}

pub struct WeatherSkill {
    source: Arc<dyn WeatherSource>,
    llm: Arc<dyn LanguageModel>,
    default_location: Option<String>,
    lookup_timeout: Duration,
    llm_timeout: Duration,
}

impl WeatherSkill {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        llm: Arc<dyn LanguageModel>,
        lookup_timeout: Duration,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            source,
            llm,
            default_location: None,
            lookup_timeout,
            llm_timeout,
        }
    }

    pub fn with_default_location(mut self, location: Option<String>) -> Self {
        self.default_location = location;
        self
    }

    /// Location to look up: the extracted one, else the configured default
    pub fn resolve_location<'a>(&'a self, extracted: Option<&'a str>) -> Option<&'a str> {
        extracted.or(self.default_location.as_deref())
    }

    pub async fn run(&self, extracted_location: Option<&str>) -> StepResult<WeatherOutcome> {
        let location = self
            .resolve_location(extracted_location)
            .ok_or_else(|| StepError::lookup("no location given and no default configured"))?;

        let reading = bounded(
            "weather lookup",
            self.lookup_timeout,
            self.source.fetch(location),
        )
        .await?;

        match self.analyze(&reading).await {
            Ok(analysis) => Ok(WeatherOutcome {
                data: WeatherData {
                    reading,
                    analysis: Some(analysis),
                },
                enrichment_error: None,
            }),
            Err(e) => {
                tracing::warn!(
                    location,
                    error = %e,
                    "Weather enrichment failed, using raw reading"
                );
                Ok(WeatherOutcome {
                    data: WeatherData::raw(reading),
                    enrichment_error: Some(e),
                })
            }
        }
    }

    async fn analyze(&self, reading: &WeatherReading) -> StepResult<WeatherAnalysis> {
        let prompt = format!(
            "Current weather:\n- Location: {}\n- Temperature: {:.1}°C (feels like {:.1}°C)\n- Conditions: {}\n- Description: {}\n- Humidity: {}%\n- Wind: {:.1} km/h",
            reading.location,
            reading.temperature,
            reading.feels_like,
            reading.conditions.join(", "),
            reading.description,
            reading.humidity,
            reading.wind_speed
        );
        let text = bounded(
            "weather analysis completion",
            self.llm_timeout,
            self.llm.complete(&CONTRACT, &prompt),
        )
        .await?;

        let mut analysis: WeatherAnalysis = decode_json(&text)?;
        analysis.comfort_level = analysis.comfort_level.clamp(1, 5);
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{paris_reading, FixedWeather, ScriptedModel};

    fn skill(weather: FixedWeather, llm: ScriptedModel) -> WeatherSkill {
        WeatherSkill::new(
            Arc::new(weather),
            Arc::new(llm),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_enriched_reading() {
        let llm = ScriptedModel::new().respond(
            CONTRACT.name,
            r#"{"weather_analysis": "Cool and wet", "comfort_level": 9, "key_factors": ["rain"], "recommendations": "Layer up"}"#,
        );
        let outcome = skill(FixedWeather::ok(paris_reading()), llm)
            .run(Some("Paris"))
            .await
            .unwrap();

        let analysis = outcome.data.analysis.unwrap();
        assert_eq!(analysis.weather_analysis, "Cool and wet");
        assert_eq!(analysis.comfort_level, 5);
        assert!(outcome.enrichment_error.is_none());
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_raw_reading() {
        let llm = ScriptedModel::new().respond(CONTRACT.name, "It's rainy, bring a coat!");
        let outcome = skill(FixedWeather::ok(paris_reading()), llm)
            .run(Some("Paris"))
            .await
            .unwrap();

        assert_eq!(outcome.data.reading.temperature, 15.0);
        assert!(outcome.data.analysis.is_none());
        assert_eq!(outcome.enrichment_error.unwrap().kind, ErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_missing_location_uses_default() {
        let weather = FixedWeather::ok(paris_reading());
        let calls = weather.calls();
        let skill = skill(weather, ScriptedModel::new())
            .with_default_location(Some("Leuven".to_string()));

        assert_eq!(skill.resolve_location(None), Some("Leuven"));
        assert_eq!(skill.resolve_location(Some("Paris")), Some("Paris"));

        let outcome = skill.run(None).await.unwrap();
        assert!(outcome.enrichment_error.is_some());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_location_and_no_default_is_lookup_error() {
        let err = skill(FixedWeather::ok(paris_reading()), ScriptedModel::new())
            .run(None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::LookupError);
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let err = skill(FixedWeather::failing(), ScriptedModel::new())
            .run(Some("Paris"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::LookupError);
    }
}
