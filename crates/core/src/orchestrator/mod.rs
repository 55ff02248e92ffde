//! # Turn Orchestration
//!
//! Runs a user message through the routed steps and produces a reply.
//!
//! ## Turn Flow
//!
//! ```text
//! message → Supervisor → router table → [Weather] → [Wardrobe] → [Design] → Conversation → thread append
//! ```

pub mod coordinator;
pub mod events;
pub mod init;
pub mod pipeline;
pub mod router;

pub use coordinator::{Collaborators, Orchestrator, OrchestratorConfig, TurnOutcome};
pub use events::{TurnEvent, TurnEventKind};
pub use init::StylistRuntime;
pub use pipeline::{TurnPhase, TurnPipeline};
pub use router::{steps_for, Step};
