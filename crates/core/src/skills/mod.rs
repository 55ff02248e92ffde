//! # Stylist Skills
//!
//! The five steps a turn can pass through, plus the language-model seam
//! they share.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator
//!   └── Skills (one struct per step, each returning StepResult)
//!         └── Collaborators (LanguageModel, WeatherSource, WardrobeSource)
//! ```
//!
//! - `SupervisorSkill` - routing action, location, occasion
//! - `WeatherSkill` - reading plus optional interpretation
//! - `WardrobeSkill` - ranked candidates per category
//! - `DesignSkill` - one outfit, strict decode with a single retry
//! - `ConversationSkill` - final reply

pub mod language_model;
pub mod llm_helpers;
pub mod prompts;

pub mod conversation_skill;
pub mod design_skill;
pub mod supervisor_skill;
pub mod wardrobe_skill;
pub mod weather_skill;

pub use conversation_skill::{ConversationSkill, ReplyMode};
pub use design_skill::{DesignOutcome, DesignSkill};
pub use language_model::{
    Completion, LanguageModel, RadkitLanguageModel, ResponseContract, ResponseShape,
};
pub use supervisor_skill::{SupervisorPlan, SupervisorSkill};
pub use wardrobe_skill::WardrobeSkill;
pub use weather_skill::{WeatherOutcome, WeatherSkill};
