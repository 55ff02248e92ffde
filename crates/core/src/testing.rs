//! Deterministic collaborator stubs shared by step and orchestrator tests.

use crate::error::{StepError, StepResult};
use crate::skills::{LanguageModel, ResponseContract};
use crate::state::{Category, ClothingItem, WardrobeCandidates, WeatherReading};
use crate::tools::{WardrobeSource, WeatherSource};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Language model answering per contract name.
///
/// Queued answers (`then`) are served first, then the standing answer
/// (`respond` / `fail`). With neither, the call is a completion error.
#[derive(Default)]
pub struct ScriptedModel {
    queued: Mutex<HashMap<&'static str, VecDeque<StepResult<String>>>>,
    standing: HashMap<&'static str, StepResult<String>>,
    calls: Mutex<HashMap<String, usize>>,
    prompts: Mutex<HashMap<String, String>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, contract: &'static str, text: &str) -> Self {
        self.standing.insert(contract, Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, contract: &'static str, error: StepError) -> Self {
        self.standing.insert(contract, Err(error));
        self
    }

    pub fn then(self, contract: &'static str, result: StepResult<String>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(contract)
            .or_default()
            .push_back(result);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, contract: &str) -> usize {
        self.calls.lock().unwrap().get(contract).copied().unwrap_or(0)
    }

    pub fn last_prompt(&self, contract: &str) -> Option<String> {
        self.prompts.lock().unwrap().get(contract).cloned()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, contract: &ResponseContract, prompt: &str) -> StepResult<String> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(contract.name.to_string())
            .or_default() += 1;
        self.prompts
            .lock()
            .unwrap()
            .insert(contract.name.to_string(), prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(contract.name)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(result) => result,
            None => self.standing.get(contract.name).cloned().unwrap_or_else(|| {
                Err(StepError::completion(format!("no script for '{}'", contract.name)))
            }),
        }
    }
}

/// Weather source returning the same result every time
pub struct FixedWeather {
    result: StepResult<WeatherReading>,
    calls: Arc<AtomicUsize>,
}

impl FixedWeather {
    pub fn ok(reading: WeatherReading) -> Self {
        Self {
            result: Ok(reading),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(StepError::lookup("weather service unreachable")),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl WeatherSource for FixedWeather {
    async fn fetch(&self, location: &str) -> StepResult<WeatherReading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map(|mut r| {
            r.location = location.to_string();
            r
        })
    }
}

/// Wardrobe returning fixed candidates
pub struct FixedWardrobe {
    result: StepResult<WardrobeCandidates>,
    last_top_n: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl FixedWardrobe {
    pub fn ok(candidates: WardrobeCandidates) -> Self {
        Self {
            result: Ok(candidates),
            last_top_n: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn last_top_n(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.last_top_n)
    }
}

#[async_trait]
impl WardrobeSource for FixedWardrobe {
    async fn retrieve(
        &self,
        _weather: Option<&WeatherReading>,
        _context: Option<&str>,
        top_n: usize,
    ) -> StepResult<WardrobeCandidates> {
        self.last_top_n.store(top_n, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// 15°C and rain
pub fn paris_reading() -> WeatherReading {
    WeatherReading {
        location: "Paris".to_string(),
        temperature: 15.0,
        feels_like: 14.0,
        humidity: 80,
        wind_speed: 12.0,
        description: "rain".to_string(),
        conditions: vec!["Rain".to_string()],
        observed_at: Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
    }
}

/// One candidate per category
pub fn one_per_category() -> WardrobeCandidates {
    let item = |name: &str, category, color: &str, material: &str| {
        vec![ClothingItem::new(name, category, color, material)]
    };
    WardrobeCandidates::new()
        .with(Category::Top, item("Rain Jacket", Category::Top, "yellow", "nylon"))
        .with(Category::Bottom, item("Jeans", Category::Bottom, "blue", "denim"))
        .with(Category::Footwear, item("Boots", Category::Footwear, "brown", "leather"))
        .with(Category::Outerwear, item("Trench Coat", Category::Outerwear, "beige", "cotton"))
        .with(Category::Accessories, item("Umbrella", Category::Accessories, "black", "nylon"))
}
