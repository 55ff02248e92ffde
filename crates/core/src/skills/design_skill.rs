//! # Design Skill
//!
//! Composes one outfit from the shortlisted candidates.
//!
//! The model answers with five `|`-separated fields:
//!
//! ```text
//! top|bottom|footwear|outerwear|accessory1,accessory2
//! ```
//!
//! A response is accepted when it has exactly five fields. Names are
//! matched to candidates of the same category, exactly or by containment;
//! a name that matches nothing leaves its slot empty. A response with the
//! wrong shape gets one corrective retry; a second rejection falls back to
//! [`Outfit::fallback`].

use crate::error::{StepError, StepResult};
use crate::state::{Category, ClothingItem, Outfit, WardrobeCandidates, WeatherData};
use crate::tools::bounded;
use std::sync::Arc;
use std::time::Duration;

use super::language_model::{LanguageModel, ResponseContract, ResponseShape};
use super::llm_helpers::preview;
use super::prompts;

pub const OUTFIT_FIELDS: [&str; 5] = ["top", "bottom", "footwear", "outerwear", "accessories"];

pub const CONTRACT: ResponseContract = ResponseContract {
    name: "design",
    system_prompt: prompts::DESIGN,
    shape: ResponseShape::PipeDelimited {
        fields: &OUTFIT_FIELDS,
    },
};

/// Chosen outfit and how it was reached
#[derive(Debug, Clone, PartialEq)]
pub struct DesignOutcome {
    pub outfit: Outfit,
    /// Completions requested (1 or 2)
    pub attempts: u8,
    /// Set when both attempts were rejected and the default outfit was used
    pub fallback_reason: Option<StepError>,
}

fn clean_field(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| matches!(c, '[' | ']' | '"' | '*' | '`'))
        .trim()
}

fn is_none(field: &str) -> bool {
    field.is_empty() || field.eq_ignore_ascii_case("none")
}

/// Match a named item within one category: exact name first, then either
/// name containing the other. Unmatched names leave the slot empty.
fn resolve(
    candidates: &WardrobeCandidates,
    category: Category,
    field: &str,
) -> Option<ClothingItem> {
    if is_none(field) {
        return None;
    }
    if let Some(item) = candidates.find(category, field) {
        return Some(item.clone());
    }

    let wanted = field.to_lowercase();
    let matched = candidates.get(category).iter().find(|item| {
        let name = item.name.to_lowercase();
        name.contains(&wanted) || wanted.contains(&name)
    });
    if matched.is_none() {
        tracing::debug!(%category, name = field, "Design named an item outside the candidates");
    }
    matched.cloned()
}

/// Decode a design response against the candidates it was built from.
///
/// Only the shape is strict: a line of exactly five fields. Item names are
/// matched leniently and a name that matches nothing leaves its slot empty.
pub fn parse_outfit(text: &str, candidates: &WardrobeCandidates) -> StepResult<Outfit> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| l.contains('|'))
        .ok_or_else(|| {
            StepError::parse(format!(
                "expected {} '|'-separated fields, got: {}",
                OUTFIT_FIELDS.len(),
                preview(text)
            ))
        })?;

    let fields: Vec<&str> = line.split('|').map(clean_field).collect();
    if fields.len() != OUTFIT_FIELDS.len() {
        return Err(StepError::parse(format!(
            "expected {} fields, found {}",
            OUTFIT_FIELDS.len(),
            fields.len()
        )));
    }

    let mut accessories: Vec<ClothingItem> = Vec::new();
    for name in fields[4].split(',').map(clean_field) {
        if let Some(item) = resolve(candidates, Category::Accessories, name) {
            if !accessories.contains(&item) {
                accessories.push(item);
            }
        }
    }

    Ok(Outfit {
        top: resolve(candidates, Category::Top, fields[0]),
        bottom: resolve(candidates, Category::Bottom, fields[1]),
        footwear: resolve(candidates, Category::Footwear, fields[2]),
        outerwear: resolve(candidates, Category::Outerwear, fields[3]),
        accessories,
    })
}

pub struct DesignSkill {
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl DesignSkill {
    pub fn new(llm: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn run(
        &self,
        candidates: &WardrobeCandidates,
        weather: Option<&WeatherData>,
        context: Option<&str>,
    ) -> StepResult<DesignOutcome> {
        if candidates.is_empty() {
            return Err(StepError::retrieval_empty("no wardrobe candidates to design from"));
        }

        let prompt = build_prompt(candidates, weather, context);
        let first = self.complete(&prompt).await?;
        let rejection = match parse_outfit(&first, candidates) {
            Ok(outfit) => {
                return Ok(DesignOutcome {
                    outfit,
                    attempts: 1,
                    fallback_reason: None,
                })
            }
            Err(e) => e,
        };

        tracing::warn!(reason = %rejection, "Design response rejected, retrying once");
        let retry = format!(
            "{}\n\nYour previous answer was rejected ({}).\nPrevious answer: {}\nAnswer again with exactly {} '|'-separated fields, using only item names listed above.",
            prompt,
            rejection.message,
            preview(&first),
            OUTFIT_FIELDS.len()
        );

        let second = self
            .complete(&retry)
            .await
            .and_then(|text| parse_outfit(&text, candidates));

        match second {
            Ok(outfit) => Ok(DesignOutcome {
                outfit,
                attempts: 2,
                fallback_reason: None,
            }),
            Err(e) => {
                tracing::warn!(reason = %e, "Design retry rejected, using default outfit");
                Ok(DesignOutcome {
                    outfit: Outfit::fallback(candidates),
                    attempts: 2,
                    fallback_reason: Some(e),
                })
            }
        }
    }

    async fn complete(&self, prompt: &str) -> StepResult<String> {
        bounded(
            "design completion",
            self.timeout,
            self.llm.complete(&CONTRACT, prompt),
        )
        .await
    }
}

fn build_prompt(
    candidates: &WardrobeCandidates,
    weather: Option<&WeatherData>,
    context: Option<&str>,
) -> String {
    let weather = match weather {
        Some(data) => {
            let mut text = format!("WEATHER: {}", data.reading.summary());
            if let Some(analysis) = &data.analysis {
                text.push_str(&format!("\nADVICE: {}", analysis.recommendations));
            }
            text
        }
        None => "WEATHER: unknown".to_string(),
    };

    format!(
        "{}\n\nOCCASION: {}\n\nAVAILABLE WARDROBE ITEMS:\n{}",
        weather,
        context.unwrap_or("General daily wear"),
        candidates.prompt_summary()
    )
}
