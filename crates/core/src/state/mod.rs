pub mod db;
pub mod thread;
pub mod turn_state;
pub mod wardrobe;
pub mod weather;

pub use db::StylistDb;

pub use thread::{ConversationThread, Role, Turn};
pub use turn_state::{Diagnostic, RoutingAction, RoutingDecision, TurnState};
pub use wardrobe::{Category, ClothingItem, Outfit, WardrobeCandidates};
pub use weather::{WeatherAnalysis, WeatherData, WeatherReading};
