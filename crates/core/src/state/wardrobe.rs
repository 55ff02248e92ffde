//! Wardrobe items, shortlisted candidates, and composed outfits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Clothing category. Ordering follows how an outfit is read top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Top,
    Bottom,
    Footwear,
    Outerwear,
    Accessories,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Top,
        Category::Bottom,
        Category::Footwear,
        Category::Outerwear,
        Category::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::Footwear => "footwear",
            Category::Outerwear => "outerwear",
            Category::Accessories => "accessories",
        }
    }

    /// Slots that an outfit is incomplete without
    pub fn is_essential(&self) -> bool {
        matches!(self, Category::Top | Category::Bottom | Category::Footwear)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts singular and plural spellings ("tops", "accessory")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" | "tops" => Ok(Category::Top),
            "bottom" | "bottoms" => Ok(Category::Bottom),
            "footwear" | "shoes" => Ok(Category::Footwear),
            "outerwear" => Ok(Category::Outerwear),
            "accessory" | "accessories" => Ok(Category::Accessories),
            other => Err(format!("unknown clothing category '{}'", other)),
        }
    }
}

fn default_level() -> u8 {
    3
}

/// A piece of clothing from the wardrobe store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub category: Category,
    pub color: String,
    pub material: String,
    #[serde(default)]
    pub subcategory: String,
    /// 1 (very light) to 5 (very warm)
    #[serde(default = "default_level")]
    pub warmth_level: u8,
    /// 1 (very casual) to 5 (very formal)
    #[serde(default = "default_level")]
    pub formality: u8,
    #[serde(default)]
    pub weather_suitability: Vec<String>,
    #[serde(default)]
    pub season: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl ClothingItem {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        color: impl Into<String>,
        material: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            category,
            color: color.into(),
            material: material.into(),
            subcategory: String::new(),
            warmth_level: default_level(),
            formality: default_level(),
            weather_suitability: Vec::new(),
            season: Vec::new(),
            tags: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_levels(mut self, warmth_level: u8, formality: u8) -> Self {
        self.warmth_level = warmth_level;
        self.formality = formality;
        self
    }

    pub fn with_suitability(mut self, tags: &[&str]) -> Self {
        self.weather_suitability = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Prompt line, e.g. `Navy Blazer (navy wool, warmth:3/5, formality:4/5)`
    pub fn describe(&self) -> String {
        format!(
            "{} ({} {}, warmth:{}/5, formality:{}/5)",
            self.name, self.color, self.material, self.warmth_level, self.formality
        )
    }
}

/// Ranked candidates per category. Every category is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardrobeCandidates(BTreeMap<Category, Vec<ClothingItem>>);

impl Default for WardrobeCandidates {
    fn default() -> Self {
        Self(Category::ALL.iter().map(|c| (*c, Vec::new())).collect())
    }
}

impl WardrobeCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ranked list for one category
    pub fn set(&mut self, category: Category, items: Vec<ClothingItem>) {
        self.0.insert(category, items);
    }

    pub fn with(mut self, category: Category, items: Vec<ClothingItem>) -> Self {
        self.set(category, items);
        self
    }

    pub fn get(&self, category: Category) -> &[ClothingItem] {
        self.0.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, category: Category) -> Option<&ClothingItem> {
        self.get(category).first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Essential categories with no candidates
    pub fn missing_essentials(&self) -> Vec<Category> {
        Category::ALL
            .iter()
            .copied()
            .filter(|c| c.is_essential() && self.get(*c).is_empty())
            .collect()
    }

    /// Case-insensitive lookup of an item by name within one category
    pub fn find(&self, category: Category, name: &str) -> Option<&ClothingItem> {
        let wanted = name.trim().to_lowercase();
        self.get(category)
            .iter()
            .find(|item| item.name.to_lowercase() == wanted)
    }

    /// Candidates rendered for the design prompt, one block per category
    pub fn prompt_summary(&self) -> String {
        Category::ALL
            .iter()
            .map(|category| {
                let items = self.get(*category);
                let lines = if items.is_empty() {
                    "- None available".to_string()
                } else {
                    items
                        .iter()
                        .map(|i| format!("- {}", i.describe()))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                format!("{}:\n{}", category.as_str().to_uppercase(), lines)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// One item per slot. Outerwear may legitimately be absent; an absent
/// top/bottom/footwear means the wardrobe had nothing for that slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    pub top: Option<ClothingItem>,
    pub bottom: Option<ClothingItem>,
    pub footwear: Option<ClothingItem>,
    pub outerwear: Option<ClothingItem>,
    #[serde(default)]
    pub accessories: Vec<ClothingItem>,
}

impl Outfit {
    /// First candidate per essential slot, no outerwear, no accessories
    pub fn fallback(candidates: &WardrobeCandidates) -> Self {
        Self {
            top: candidates.first(Category::Top).cloned(),
            bottom: candidates.first(Category::Bottom).cloned(),
            footwear: candidates.first(Category::Footwear).cloned(),
            outerwear: None,
            accessories: Vec::new(),
        }
    }

    pub fn slot(&self, category: Category) -> Option<&ClothingItem> {
        match category {
            Category::Top => self.top.as_ref(),
            Category::Bottom => self.bottom.as_ref(),
            Category::Footwear => self.footwear.as_ref(),
            Category::Outerwear => self.outerwear.as_ref(),
            Category::Accessories => self.accessories.first(),
        }
    }

    pub fn accessory_names(&self) -> Vec<&str> {
        self.accessories.iter().map(|a| a.name.as_str()).collect()
    }

    /// `top|bottom|footwear|outerwear|acc1,acc2` with "None" for empty slots
    pub fn to_pipe_line(&self) -> String {
        let name = |item: &Option<ClothingItem>| {
            item.as_ref()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| "None".to_string())
        };
        format!(
            "{}|{}|{}|{}|{}",
            name(&self.top),
            name(&self.bottom),
            name(&self.footwear),
            name(&self.outerwear),
            self.accessory_names().join(",")
        )
    }
}
