//! # Wardrobe Store
//!
//! SQLite-backed clothing items with a deterministic ranking used to
//! shortlist candidates for a given weather reading and occasion.

use crate::error::{StepError, StepResult, StoreError};
use crate::state::{Category, ClothingItem, StylistDb, WardrobeCandidates, WeatherReading};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::WardrobeSource;

/// Item counts for the `stats` command and endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WardrobeStats {
    pub total_items: usize,
    pub categories: BTreeMap<String, usize>,
    pub colors: BTreeMap<String, usize>,
    pub materials: BTreeMap<String, usize>,
}

pub struct WardrobeStore {
    conn: Arc<Mutex<Connection>>,
}

impl WardrobeStore {
    pub fn new(db: &StylistDb) -> Self {
        Self {
            conn: db.connection(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Insert an item, assigning an id when it has none. Returns the id.
    pub fn add_item(&self, item: &ClothingItem) -> Result<String, StoreError> {
        let conn = self.lock()?;
        insert_item(&conn, item)
    }

    /// Load a JSON array of items. Skipped when the store already has items.
    pub fn import_json<P: AsRef<Path>>(&self, path: P) -> Result<usize, StoreError> {
        let existing = self.count()?;
        if existing > 0 {
            tracing::info!(existing, "Wardrobe already populated, skipping import");
            return Ok(0);
        }

        let raw = std::fs::read_to_string(path.as_ref())?;
        let items: Vec<ClothingItem> = serde_json::from_str(&raw)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for item in &items {
            insert_item(&tx, item)?;
        }
        tx.commit()?;

        tracing::info!(count = items.len(), path = %path.as_ref().display(), "Imported wardrobe");
        Ok(items.len())
    }

    pub fn list_items(&self) -> Result<Vec<ClothingItem>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, category, subcategory, color, material, warmth_level,
                   formality, weather_json, season_json, tags_json, description
            FROM wardrobe_items
            ORDER BY name ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ItemRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    subcategory: row.get(3)?,
                    color: row.get(4)?,
                    material: row.get(5)?,
                    warmth_level: row.get(6)?,
                    formality: row.get(7)?,
                    weather_json: row.get(8)?,
                    season_json: row.get(9)?,
                    tags_json: row.get(10)?,
                    description: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    pub fn remove_item(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM wardrobe_items WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Delete every item. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM wardrobe_items", [])?)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM wardrobe_items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn stats(&self) -> Result<WardrobeStats, StoreError> {
        let items = self.list_items()?;
        let mut stats = WardrobeStats {
            total_items: items.len(),
            ..Default::default()
        };
        for item in &items {
            *stats.categories.entry(item.category.to_string()).or_default() += 1;
            *stats.colors.entry(item.color.to_lowercase()).or_default() += 1;
            *stats.materials.entry(item.material.to_lowercase()).or_default() += 1;
        }
        Ok(stats)
    }
}

#[async_trait]
impl WardrobeSource for WardrobeStore {
    async fn retrieve(
        &self,
        weather: Option<&WeatherReading>,
        context: Option<&str>,
        top_n: usize,
    ) -> StepResult<WardrobeCandidates> {
        let items = self.list_items().map_err(|e| {
            tracing::warn!(error = %e, "Wardrobe store unavailable");
            StepError::store_unavailable(format!("wardrobe store unavailable: {}", e))
        })?;
        Ok(rank(&items, weather, context, top_n))
    }
}

fn insert_item(conn: &Connection, item: &ClothingItem) -> Result<String, StoreError> {
    let id = item
        .id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    conn.execute(
        r#"
        INSERT OR REPLACE INTO wardrobe_items
            (id, name, category, subcategory, color, material, warmth_level,
             formality, weather_json, season_json, tags_json, description)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            id,
            item.name,
            item.category.as_str(),
            item.subcategory,
            item.color,
            item.material,
            item.warmth_level,
            item.formality,
            serde_json::to_string(&item.weather_suitability)?,
            serde_json::to_string(&item.season)?,
            serde_json::to_string(&item.tags)?,
            item.description,
        ],
    )?;
    Ok(id)
}

struct ItemRow {
    id: String,
    name: String,
    category: String,
    subcategory: String,
    color: String,
    material: String,
    warmth_level: u8,
    formality: u8,
    weather_json: String,
    season_json: String,
    tags_json: String,
    description: String,
}

impl ItemRow {
    fn into_item(self) -> Result<ClothingItem, StoreError> {
        let category: Category = self.category.parse().map_err(StoreError::Corrupt)?;
        Ok(ClothingItem {
            id: Some(self.id),
            name: self.name,
            category,
            color: self.color,
            material: self.material,
            subcategory: self.subcategory,
            warmth_level: self.warmth_level,
            formality: self.formality,
            weather_suitability: serde_json::from_str(&self.weather_json)?,
            season: serde_json::from_str(&self.season_json)?,
            tags: serde_json::from_str(&self.tags_json)?,
            description: self.description,
        })
    }
}

/// Warmth an outfit should have for a feels-like temperature (°C)
fn target_warmth(feels_like: f64) -> u8 {
    match feels_like {
        t if t <= 0.0 => 5,
        t if t <= 8.0 => 4,
        t if t <= 15.0 => 3,
        t if t <= 22.0 => 2,
        _ => 1,
    }
}

/// Formality implied by the occasion, if any keyword is recognized
fn target_formality(context: &str) -> Option<u8> {
    const LEVELS: &[(&[&str], u8)] = &[
        (&["wedding", "gala", "formal", "interview", "funeral"], 5),
        (&["office", "work", "business", "meeting", "presentation"], 4),
        (&["dinner", "date", "party", "theater", "theatre"], 3),
        (&["casual", "weekend", "shopping", "brunch"], 2),
        (&["gym", "hike", "hiking", "run", "running", "sport", "beach"], 1),
    ];
    let context = context.to_lowercase();
    LEVELS
        .iter()
        .find(|(words, _)| words.iter().any(|w| context.contains(w)))
        .map(|(_, level)| *level)
}

/// Terms an item's suitability tags are matched against
fn weather_terms(weather: &WeatherReading) -> Vec<String> {
    let mut terms = weather.condition_terms();
    let band = match weather.feels_like {
        t if t < 10.0 => "cold",
        t if t < 20.0 => "mild",
        _ => "warm",
    };
    terms.push(band.to_string());
    if weather.wind_speed >= 30.0 {
        terms.push("windy".to_string());
    }
    terms.retain(|t| t.len() >= 3);
    terms
}

fn score(
    item: &ClothingItem,
    warmth: Option<u8>,
    formality: Option<u8>,
    terms: &[String],
    context_words: &[String],
) -> i32 {
    let mut score = 0i32;
    if let Some(target) = warmth {
        score -= 2 * (item.warmth_level as i32 - target as i32).abs();
    }
    if let Some(target) = formality {
        score -= (item.formality as i32 - target as i32).abs();
    }
    for tag in &item.weather_suitability {
        let tag = tag.to_lowercase();
        if terms.iter().any(|t| tag.starts_with(t.as_str()) || t.starts_with(tag.as_str())) {
            score += 2;
        }
    }
    if item
        .tags
        .iter()
        .any(|tag| context_words.iter().any(|w| tag.eq_ignore_ascii_case(w)))
    {
        score += 1;
    }
    score
}

/// Rank items per category: best match first, ties broken by name
pub fn rank(
    items: &[ClothingItem],
    weather: Option<&WeatherReading>,
    context: Option<&str>,
    top_n: usize,
) -> WardrobeCandidates {
    let warmth = weather.map(|w| target_warmth(w.feels_like));
    let formality = context.and_then(target_formality);
    let terms = weather.map(weather_terms).unwrap_or_default();
    let context_words: Vec<String> = context
        .map(|c| c.split_whitespace().map(|w| w.to_lowercase()).collect())
        .unwrap_or_default();

    let mut candidates = WardrobeCandidates::new();
    for category in Category::ALL {
        let mut scored: Vec<(i32, &ClothingItem)> = items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| (score(i, warmth, formality, &terms, &context_words), i))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
        candidates.set(
            category,
            scored.into_iter().take(top_n).map(|(_, i)| i.clone()).collect(),
        );
    }
    candidates
}
