//! # Conversation Skill
//!
//! Renders the final reply from whatever the turn gathered. This is the
//! only step whose failure fails the turn.

use crate::error::{StepError, StepResult};
use crate::state::{Category, ConversationThread, RoutingAction, TurnState};
use crate::tools::bounded;
use std::sync::Arc;
use std::time::Duration;

use super::language_model::{LanguageModel, ResponseContract, ResponseShape};
use super::prompts;

pub const CONTRACT: ResponseContract = ResponseContract {
    name: "conversation",
    system_prompt: prompts::CONVERSATION,
    shape: ResponseShape::FreeText,
};

const HISTORY_WINDOW: usize = 10;

/// What kind of reply the turn calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Present the chosen outfit (and weather, when known)
    Recommend,
    WeatherReport,
    WardrobeOverview,
    /// Small talk; no lookups were requested
    Chat,
    /// Some lookups succeeded but not enough for the requested answer
    Limited,
    /// Nothing usable was gathered; ask the user a question
    Clarify,
}

impl ReplyMode {
    fn instruction(&self) -> &'static str {
        match self {
            ReplyMode::Recommend => {
                "Recommend the outfit below, explaining briefly how it suits the weather and occasion."
            }
            ReplyMode::WeatherReport => {
                "Describe the weather below and what it means for clothing. Do not pick an outfit."
            }
            ReplyMode::WardrobeOverview => {
                "Answer the user's wardrobe question using only the items listed below."
            }
            ReplyMode::Chat => "Reply to the user in a friendly, concise way.",
            ReplyMode::Limited => {
                "Share what you found, say briefly what could not be looked up, and suggest a next step."
            }
            ReplyMode::Clarify => {
                "You could not gather enough information. Ask one short clarifying question, such as which city the user is in or what the occasion is."
            }
        }
    }
}

/// Pick the reply mode from the accumulated state
pub fn reply_mode(state: &TurnState) -> ReplyMode {
    if state.routing().map_or(true, |r| r.fallback) {
        return ReplyMode::Clarify;
    }

    let has_candidates = state.wardrobe_candidates().is_some_and(|c| !c.is_empty());
    match state.routing_action() {
        RoutingAction::FullRecommendation if state.final_outfit().is_some() => ReplyMode::Recommend,
        RoutingAction::FullRecommendation if state.weather_data().is_some() => {
            ReplyMode::WeatherReport
        }
        RoutingAction::WeatherOnly if state.weather_data().is_some() => ReplyMode::WeatherReport,
        RoutingAction::FullRecommendation | RoutingAction::WardrobeOnly if has_candidates => {
            ReplyMode::WardrobeOverview
        }
        RoutingAction::ConversationOnly => ReplyMode::Chat,
        _ if state.has_findings() => ReplyMode::Limited,
        _ => ReplyMode::Clarify,
    }
}

/// Facts gathered this turn, rendered for the prompt
pub fn findings(state: &TurnState) -> String {
    let mut sections = Vec::new();

    if let Some(location) = state.extracted_location() {
        sections.push(format!("LOCATION: {}", location));
    }
    if let Some(context) = state.extracted_context() {
        sections.push(format!("OCCASION: {}", context));
    }
    if let Some(weather) = state.weather_data() {
        let mut text = format!("WEATHER: {}", weather.reading.summary());
        if let Some(analysis) = &weather.analysis {
            text.push_str(&format!(
                "\nANALYSIS: {} (comfort {}/5). {}",
                analysis.weather_analysis, analysis.comfort_level, analysis.recommendations
            ));
        }
        sections.push(text);
    }
    if let Some(outfit) = state.final_outfit() {
        let slots = [
            Category::Top,
            Category::Bottom,
            Category::Footwear,
            Category::Outerwear,
        ];
        let lines: Vec<String> = slots
            .iter()
            .map(|c| match outfit.slot(*c) {
                Some(item) => format!("- {}: {}", c, item.describe()),
                None => format!("- {}: none", c),
            })
            .chain(std::iter::once(format!(
                "- accessories: {}",
                if outfit.accessories.is_empty() {
                    "none".to_string()
                } else {
                    outfit.accessory_names().join(", ")
                }
            )))
            .collect();
        sections.push(format!("OUTFIT:\n{}", lines.join("\n")));
    } else if let Some(candidates) = state.wardrobe_candidates() {
        if !candidates.is_empty() {
            sections.push(format!("WARDROBE CANDIDATES:\n{}", candidates.prompt_summary()));
        }
    }
    if !state.diagnostics().is_empty() {
        let notes: Vec<String> = state
            .diagnostics()
            .iter()
            .map(|d| format!("- {}: {}", d.stage, d.note))
            .collect();
        sections.push(format!("LIMITATIONS:\n{}", notes.join("\n")));
    }

    if sections.is_empty() {
        "No findings.".to_string()
    } else {
        sections.join("\n\n")
    }
}

pub struct ConversationSkill {
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl ConversationSkill {
    pub fn new(llm: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn run(&self, state: &TurnState, history: &ConversationThread) -> StepResult<String> {
        let mode = reply_mode(state);
        let prompt = build_prompt(state, history, mode);
        let reply = bounded(
            "conversation completion",
            self.timeout,
            self.llm.complete(&CONTRACT, &prompt),
        )
        .await?;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(StepError::completion("language model returned an empty reply"));
        }
        tracing::debug!(?mode, chars = reply.len(), "Rendered reply");
        Ok(reply.to_string())
    }
}

fn build_prompt(state: &TurnState, history: &ConversationThread, mode: ReplyMode) -> String {
    let start = history.turns.len().saturating_sub(HISTORY_WINDOW);
    let transcript = ConversationThread {
        thread_id: history.thread_id.clone(),
        turns: history.turns[start..].to_vec(),
    }
    .transcript();

    let mut prompt = String::new();
    if !transcript.is_empty() {
        prompt.push_str(&format!("CONVERSATION SO FAR:\n{}\n\n", transcript));
    }
    prompt.push_str(&format!(
        "USER MESSAGE: {}\n\nFINDINGS:\n{}\n\nTASK: {}",
        state.user_message(),
        findings(state),
        mode.instruction()
    ));
    prompt
}
