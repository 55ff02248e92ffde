//! # Stylist Configuration
//!
//! Settings are layered: built-in defaults, then `.stylist/config.json`,
//! then environment variables.

use crate::memory::MemoryProvider;
use crate::models::{LlmProvider, ModelConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default location of the persisted settings file
pub const CONFIG_PATH: &str = ".stylist/config.json";

/// Runtime configuration for the orchestrator and its collaborators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StylistConfig {
    /// Model used by every language-model step
    pub model: ModelConfig,
    /// OpenWeatherMap API key
    #[serde(skip_serializing)]
    pub weather_api_key: Option<String>,
    /// Location used when the user doesn't name one
    pub default_location: Option<String>,
    /// Candidates shortlisted per wardrobe category
    pub top_n: usize,
    /// Turns kept per conversation thread (user and assistant each count)
    pub max_history_turns: usize,
    pub llm_timeout_secs: u64,
    pub weather_timeout_secs: u64,
    pub wardrobe_timeout_secs: u64,
    /// SQLite database for the wardrobe and, optionally, conversation memory
    pub db_path: String,
    pub memory_provider: MemoryProvider,
}

impl Default for StylistConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            weather_api_key: None,
            default_location: None,
            top_n: 4,
            max_history_turns: 20,
            llm_timeout_secs: 30,
            weather_timeout_secs: 10,
            wardrobe_timeout_secs: 5,
            db_path: ".stylist/stylist.db".to_string(),
            memory_provider: MemoryProvider::InMemory,
        }
    }
}

/// Partial settings as stored on disk; absent fields keep the current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedConfig {
    provider: Option<LlmProvider>,
    model: Option<String>,
    base_url: Option<String>,
    default_location: Option<String>,
    top_n: Option<usize>,
    max_history_turns: Option<usize>,
    llm_timeout_secs: Option<u64>,
    weather_timeout_secs: Option<u64>,
    wardrobe_timeout_secs: Option<u64>,
    db_path: Option<String>,
    memory_provider: Option<MemoryProvider>,
}

impl StylistConfig {
    /// Load defaults, the settings file at [`CONFIG_PATH`], and the environment
    pub async fn load() -> Result<Self> {
        Self::load_from(CONFIG_PATH).await
    }

    pub async fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::default();
        let path = path.as_ref();
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let persisted: PersistedConfig = serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings in {}", path.display()))?;
            config.merge(persisted);
        }
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn merge(&mut self, other: PersistedConfig) {
        if let Some(provider) = other.provider {
            if other.model.is_none() {
                self.model.model = provider.default_model().to_string();
            }
            self.model.provider = provider;
        }
        if let Some(model) = other.model {
            self.model.model = model;
        }
        if other.base_url.is_some() {
            self.model.base_url = other.base_url;
        }
        if other.default_location.is_some() {
            self.default_location = other.default_location;
        }
        if let Some(v) = other.top_n {
            self.top_n = v;
        }
        if let Some(v) = other.max_history_turns {
            self.max_history_turns = v;
        }
        if let Some(v) = other.llm_timeout_secs {
            self.llm_timeout_secs = v;
        }
        if let Some(v) = other.weather_timeout_secs {
            self.weather_timeout_secs = v;
        }
        if let Some(v) = other.wardrobe_timeout_secs {
            self.wardrobe_timeout_secs = v;
        }
        if let Some(v) = other.db_path {
            self.db_path = v;
        }
        if let Some(v) = other.memory_provider {
            self.memory_provider = v;
        }
    }

    /// Apply `STYLIST_*` and key variables using the given lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("STYLIST_PROVIDER") {
            match provider.parse::<LlmProvider>() {
                Ok(p) => {
                    self.model.model = p.default_model().to_string();
                    self.model.provider = p;
                }
                Err(e) => tracing::warn!("Ignoring STYLIST_PROVIDER: {}", e),
            }
        }
        if let Some(model) = get("STYLIST_MODEL") {
            self.model.model = model;
        }
        if let Some(url) = get("STYLIST_BASE_URL") {
            self.model.base_url = Some(url);
        }
        if let Some(key) = get("WEATHER_API_KEY") {
            self.weather_api_key = Some(key);
        }
        if let Some(location) = get("STYLIST_DEFAULT_LOCATION") {
            self.default_location = Some(location);
        }
        if let Some(top_n) = get("STYLIST_TOP_N") {
            match top_n.parse() {
                Ok(n) => self.top_n = n,
                Err(_) => tracing::warn!("Ignoring non-numeric STYLIST_TOP_N={}", top_n),
            }
        }
        if let Some(path) = get("STYLIST_DB_PATH") {
            self.db_path = path;
        }
        if let Some(memory) = get("STYLIST_MEMORY") {
            match memory.to_lowercase().as_str() {
                "sqlite" => self.memory_provider = MemoryProvider::Sqlite,
                "in_memory" | "memory" => self.memory_provider = MemoryProvider::InMemory,
                other => tracing::warn!("Ignoring unknown STYLIST_MEMORY={}", other),
            }
        }
    }

    /// Fail on inconsistent settings, or when the selected provider has no
    /// API key in the environment
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            anyhow::bail!("top_n must be at least 1");
        }
        if self.max_history_turns % 2 != 0 {
            anyhow::bail!(
                "max_history_turns must be even (one user and one assistant turn per exchange), got {}",
                self.max_history_turns
            );
        }

        let var = self.model.provider.api_key_env();
        if std::env::var(var).map(|v| v.is_empty()).unwrap_or(true) {
            anyhow::bail!(
                "{} is required for provider {}. Set it in .env or the environment.",
                var,
                self.model.provider.display_name()
            );
        }
        Ok(())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_secs(self.weather_timeout_secs)
    }

    pub fn wardrobe_timeout(&self) -> Duration {
        Duration::from_secs(self.wardrobe_timeout_secs)
    }

    /// Non-sensitive view of the settings; keys are reported as set or unset
    pub fn redacted(&self) -> serde_json::Value {
        let key_set = std::env::var(self.model.provider.api_key_env())
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        serde_json::json!({
            "provider": self.model.provider.display_name(),
            "model": self.model.model,
            "base_url": self.model.base_url,
            "llm_api_key": if key_set { "set" } else { "unset" },
            "weather_api_key": if self.weather_api_key.is_some() { "set" } else { "unset" },
            "default_location": self.default_location,
            "top_n": self.top_n,
            "max_history_turns": self.max_history_turns,
            "llm_timeout_secs": self.llm_timeout_secs,
            "weather_timeout_secs": self.weather_timeout_secs,
            "wardrobe_timeout_secs": self.wardrobe_timeout_secs,
            "db_path": self.db_path,
            "memory_provider": self.memory_provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StylistConfig::default();
        assert_eq!(config.top_n, 4);
        assert_eq!(config.max_history_turns, 20);
        assert_eq!(config.llm_timeout(), Duration::from_secs(30));
        assert_eq!(config.memory_provider, MemoryProvider::InMemory);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("STYLIST_PROVIDER", "anthropic"),
            ("STYLIST_DEFAULT_LOCATION", "Leuven"),
            ("STYLIST_TOP_N", "6"),
            ("STYLIST_MEMORY", "sqlite"),
            ("WEATHER_API_KEY", "  "),
        ]);
        let mut config = StylistConfig::default();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.model.provider, LlmProvider::Anthropic);
        assert_eq!(config.model.model, LlmProvider::Anthropic.default_model());
        assert_eq!(config.default_location.as_deref(), Some("Leuven"));
        assert_eq!(config.top_n, 6);
        assert_eq!(config.memory_provider, MemoryProvider::Sqlite);
        // Blank values are treated as unset.
        assert!(config.weather_api_key.is_none());
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = StylistConfig::default();
        config.apply_env_with(|k| match k {
            "STYLIST_TOP_N" => Some("many".to_string()),
            "STYLIST_PROVIDER" => Some("mistral".to_string()),
            _ => None,
        });
        assert_eq!(config.top_n, 4);
        assert_eq!(config.model.provider, LlmProvider::OpenAI);
    }

    #[test]
    fn test_merge_persisted() {
        let persisted: PersistedConfig = serde_json::from_str(
            r#"{"provider": "gemini", "top_n": 2, "default_location": "Tokyo"}"#,
        )
        .unwrap();
        let mut config = StylistConfig::default();
        config.merge(persisted);
        assert_eq!(config.model.provider, LlmProvider::Gemini);
        assert_eq!(config.model.model, "gemini-2.0-flash-exp");
        assert_eq!(config.top_n, 2);
        assert_eq!(config.default_location.as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_redacted_hides_keys() {
        let config = StylistConfig {
            weather_api_key: Some("secret-weather-key".to_string()),
            ..Default::default()
        };
        let view = config.redacted().to_string();
        assert!(!view.contains("secret-weather-key"));
        assert!(view.contains("\"weather_api_key\":\"set\""));
    }

    #[test]
    fn test_validate_rejects_odd_history_cap() {
        let config = StylistConfig {
            max_history_turns: 7,
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_history_turns must be even"), "{}", err);
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let config = StylistConfig::load_from("/nonexistent/stylist/config.json")
            .await
            .unwrap();
        assert_eq!(config.top_n, StylistConfig::default().top_n);
    }
}
