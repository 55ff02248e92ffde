//! Default prompt templates bundled at compile time.

/// Supervisor - routes the turn and extracts location/occasion
pub const SUPERVISOR: &str = include_str!("defaults/supervisor.md");

/// Weather analyst - qualitative reading of raw conditions
pub const WEATHER: &str = include_str!("defaults/weather.md");

/// Stylist - picks one item per category
pub const DESIGN: &str = include_str!("defaults/design.md");

/// Conversation - renders the final reply
pub const CONVERSATION: &str = include_str!("defaults/conversation.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("supervisor", SUPERVISOR),
        ("weather", WEATHER),
        ("design", DESIGN),
        ("conversation", CONVERSATION),
    ]
}
