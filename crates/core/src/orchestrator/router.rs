//! # Router
//!
//! The single source of truth for which steps a turn runs. A pure
//! function of the routing action; no step picks its own successor.

use crate::state::{RoutingAction, TurnState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A step that runs after routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Weather,
    Wardrobe,
    Design,
    Conversation,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Weather => "weather",
            Step::Wardrobe => "wardrobe",
            Step::Design => "design",
            Step::Conversation => "conversation",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const FULL: &[Step] = &[Step::Weather, Step::Wardrobe, Step::Design, Step::Conversation];
const WEATHER: &[Step] = &[Step::Weather, Step::Conversation];
const WARDROBE: &[Step] = &[Step::Wardrobe, Step::Conversation];
const CONVERSATION: &[Step] = &[Step::Conversation];

/// Ordered steps for a routing action. Conversation is always last.
pub fn steps_for(action: RoutingAction) -> &'static [Step] {
    match action {
        RoutingAction::FullRecommendation => FULL,
        RoutingAction::WeatherOnly => WEATHER,
        RoutingAction::WardrobeOnly => WARDROBE,
        RoutingAction::ConversationOnly => CONVERSATION,
    }
}

/// Steps for a routed turn
pub fn plan(state: &TurnState) -> &'static [Step] {
    steps_for(state.routing_action())
}
