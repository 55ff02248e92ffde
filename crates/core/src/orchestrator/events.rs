//! # Turn Events
//!
//! Progress notifications published while a turn runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnEventKind {
    TurnStarted,
    /// Supervisor finished; data carries the routing action and step list
    Routed,
    StepStarted,
    StepCompleted,
    /// Step failed and the turn continues without its output
    StepDegraded,
    TurnCompleted,
    TurnFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub thread_id: String,
    pub kind: TurnEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TurnEvent {
    pub fn new(kind: TurnEventKind, thread_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            thread_id: thread_id.to_string(),
            kind,
            step: None,
            data: None,
        }
    }

    pub fn with_step(mut self, step: &str) -> Self {
        self.step = Some(step.to_string());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
