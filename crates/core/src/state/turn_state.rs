//! # Turn State
//!
//! Working record for one user turn. Each field is written at most once;
//! later steps may read earlier fields but never replace them.

use crate::error::{ErrorKind, StepError, TurnError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::wardrobe::{Outfit, WardrobeCandidates};
use super::weather::WeatherData;

/// Supervisor's classification of what the user wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAction {
    FullRecommendation,
    WeatherOnly,
    WardrobeOnly,
    ConversationOnly,
}

impl RoutingAction {
    pub const ALL: [RoutingAction; 4] = [
        RoutingAction::FullRecommendation,
        RoutingAction::WeatherOnly,
        RoutingAction::WardrobeOnly,
        RoutingAction::ConversationOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingAction::FullRecommendation => "full_recommendation",
            RoutingAction::WeatherOnly => "weather_only",
            RoutingAction::WardrobeOnly => "wardrobe_only",
            RoutingAction::ConversationOnly => "conversation_only",
        }
    }
}

impl fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingAction {
    type Err = String;

    /// Canonical labels plus the older supervisor vocabulary
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full_recommendation" => Ok(RoutingAction::FullRecommendation),
            "weather_only" => Ok(RoutingAction::WeatherOnly),
            "wardrobe_only" | "design_followup" => Ok(RoutingAction::WardrobeOnly),
            "conversation_only" | "chitchat" | "general_chat" | "unknown" => {
                Ok(RoutingAction::ConversationOnly)
            }
            other => Err(format!("unknown routing action '{}'", other)),
        }
    }
}

/// Routing action plus whether the supervisor had to fall back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub action: RoutingAction,
    /// True when the supervisor output was unusable
    pub fallback: bool,
}

impl RoutingDecision {
    pub fn planned(action: RoutingAction) -> Self {
        Self {
            action,
            fallback: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            action: RoutingAction::ConversationOnly,
            fallback: true,
        }
    }
}

/// Non-fatal error note attached to a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Step that produced the note ("supervisor", "weather", ...)
    pub stage: String,
    pub kind: ErrorKind,
    /// User-safe description; collaborator detail stays in the logs
    pub note: String,
}

impl Diagnostic {
    pub fn from_error(stage: &str, error: &StepError) -> Self {
        let note = match error.kind {
            ErrorKind::ParseError => "received an unreadable response; used a fallback",
            ErrorKind::LookupError => "weather information was unavailable",
            ErrorKind::RetrievalEmpty => "no matching wardrobe items were found",
            ErrorKind::CompletionError => "the language model could not be reached",
            ErrorKind::Timeout => "a lookup took too long and was skipped",
            ErrorKind::ThreadStoreError => "conversation memory was unavailable",
            ErrorKind::StoreUnavailable => "the wardrobe could not be read",
        };
        Self {
            stage: stage.to_string(),
            kind: error.kind,
            note: note.to_string(),
        }
    }
}

fn write_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), TurnError> {
    if slot.is_some() {
        return Err(TurnError::FieldOverwrite(field));
    }
    *slot = Some(value);
    Ok(())
}

/// Mutable working record owned by the orchestrator for one turn
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnState {
    user_message: String,
    extracted_location: Option<String>,
    extracted_context: Option<String>,
    routing: Option<RoutingDecision>,
    weather_data: Option<WeatherData>,
    wardrobe_candidates: Option<WardrobeCandidates>,
    final_outfit: Option<Outfit>,
    conversation_reply: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl TurnState {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn extracted_location(&self) -> Option<&str> {
        self.extracted_location.as_deref()
    }

    pub fn extracted_context(&self) -> Option<&str> {
        self.extracted_context.as_deref()
    }

    pub fn routing(&self) -> Option<RoutingDecision> {
        self.routing
    }

    /// Routing action, `conversation_only` until the supervisor has run
    pub fn routing_action(&self) -> RoutingAction {
        self.routing
            .map(|r| r.action)
            .unwrap_or(RoutingAction::ConversationOnly)
    }

    pub fn weather_data(&self) -> Option<&WeatherData> {
        self.weather_data.as_ref()
    }

    pub fn wardrobe_candidates(&self) -> Option<&WardrobeCandidates> {
        self.wardrobe_candidates.as_ref()
    }

    pub fn final_outfit(&self) -> Option<&Outfit> {
        self.final_outfit.as_ref()
    }

    pub fn conversation_reply(&self) -> Option<&str> {
        self.conversation_reply.as_deref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn set_location(&mut self, location: String) -> Result<(), TurnError> {
        write_once(&mut self.extracted_location, location, "extracted_location")
    }

    pub fn set_context(&mut self, context: String) -> Result<(), TurnError> {
        write_once(&mut self.extracted_context, context, "extracted_context")
    }

    pub fn set_routing(&mut self, routing: RoutingDecision) -> Result<(), TurnError> {
        write_once(&mut self.routing, routing, "routing_action")
    }

    pub fn set_weather(&mut self, weather: WeatherData) -> Result<(), TurnError> {
        write_once(&mut self.weather_data, weather, "weather_data")
    }

    pub fn set_candidates(&mut self, candidates: WardrobeCandidates) -> Result<(), TurnError> {
        write_once(&mut self.wardrobe_candidates, candidates, "wardrobe_candidates")
    }

    pub fn set_outfit(&mut self, outfit: Outfit) -> Result<(), TurnError> {
        write_once(&mut self.final_outfit, outfit, "final_outfit")
    }

    pub fn set_reply(&mut self, reply: String) -> Result<(), TurnError> {
        write_once(&mut self.conversation_reply, reply, "conversation_reply")
    }

    pub fn record(&mut self, stage: &str, error: &StepError) {
        self.diagnostics.push(Diagnostic::from_error(stage, error));
    }

    /// Whether any step produced something the reply can talk about
    pub fn has_findings(&self) -> bool {
        self.extracted_location.is_some()
            || self.extracted_context.is_some()
            || self.weather_data.is_some()
            || self.wardrobe_candidates.as_ref().is_some_and(|c| !c.is_empty())
            || self.final_outfit.is_some()
    }
}
