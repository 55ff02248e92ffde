//! # Runtime Initialization
//!
//! Wires the production collaborators from a [`StylistConfig`]: the radkit
//! language model, the OpenWeatherMap client, the SQLite wardrobe, and the
//! configured thread store.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::StylistConfig;
use crate::memory::build_thread_store;
use crate::skills::RadkitLanguageModel;
use crate::state::StylistDb;
use crate::tools::{OpenWeatherClient, WardrobeStore};

use super::coordinator::{Collaborators, Orchestrator, OrchestratorConfig};
use super::events::TurnEvent;

/// Capacity of the turn event channel
const EVENT_CAPACITY: usize = 256;

/// Everything a transport shell needs
pub struct StylistRuntime {
    pub config: StylistConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub wardrobe: Arc<WardrobeStore>,
    pub events: broadcast::Sender<TurnEvent>,
}

impl StylistRuntime {
    /// Open the database at `config.db_path` and build the orchestrator
    pub fn from_config(config: StylistConfig) -> Result<Self> {
        let db = StylistDb::open_at(&config.db_path)
            .with_context(|| format!("Failed to open database at {}", config.db_path))?;
        Self::with_db(config, &db)
    }

    /// Build against an already-open database
    pub fn with_db(config: StylistConfig, db: &StylistDb) -> Result<Self> {
        let wardrobe = Arc::new(WardrobeStore::new(db));
        let weather =
            OpenWeatherClient::new(config.weather_api_key.clone(), config.weather_timeout())
                .context("Failed to build weather client")?;
        let threads = build_thread_store(config.memory_provider, db, config.max_history_turns);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let collaborators = Collaborators {
            llm: Arc::new(RadkitLanguageModel::new(config.model.clone())),
            weather: Arc::new(weather),
            wardrobe: wardrobe.clone(),
        };
        let orchestrator =
            Orchestrator::new(collaborators, threads, OrchestratorConfig::from(&config))
                .with_event_channel(events.clone());

        tracing::info!(
            provider = ?config.model.provider,
            model = %config.model.model,
            memory = ?config.memory_provider,
            "Stylist runtime ready"
        );

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
            wardrobe,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }
}
