//! # Stylist Core
//!
//! Weather-aware outfit recommendation: the turn orchestrator, its steps,
//! the weather and wardrobe collaborators, and per-thread conversation
//! memory.
//!
//! ## Architecture
//!
//! - `orchestrator/` - turn flow, router table, phase tracking, events
//! - `skills/` - one struct per step plus the language-model seam
//! - `tools/` - weather client and wardrobe store
//! - `memory/` - in-memory and SQLite thread stores
//! - `state/` - turn state, wardrobe and weather models, database
//! - `config` / `models` - layered settings and LLM provider selection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stylist_core::{config::StylistConfig, orchestrator::StylistRuntime};
//!
//! let runtime = StylistRuntime::from_config(StylistConfig::load().await?)?;
//! let outcome = runtime
//!     .orchestrator
//!     .handle_turn("thread-1", "What should I wear in Paris today?", None, None)
//!     .await;
//! println!("{}", outcome.reply);
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod skills;
pub mod state;
pub mod telemetry;
pub mod tools;

#[cfg(test)]
mod testing;
