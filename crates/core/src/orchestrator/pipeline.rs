//! # Turn Phases
//!
//! `received → routed → executing(i) → completed | failed`

use serde::{Deserialize, Serialize};

use super::router::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum TurnPhase {
    /// Turn accepted, supervisor not yet run
    Received,
    /// Step list fixed
    Routed,
    /// Running the step at `step_index` in the routed list
    Executing { step_index: usize, step: Step },
    Completed,
    Failed,
}

/// The turn state machine
#[derive(Debug, Clone)]
pub struct TurnPipeline {
    phase: TurnPhase,
    steps: &'static [Step],
}

impl Default for TurnPipeline {
    fn default() -> Self {
        Self {
            phase: TurnPhase::Received,
            steps: &[],
        }
    }
}

impl TurnPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn steps(&self) -> &'static [Step] {
        self.steps
    }

    /// Fix the step list. Only valid from `received`.
    pub fn route(&mut self, steps: &'static [Step]) {
        if self.phase == TurnPhase::Received {
            self.steps = steps;
            self.phase = TurnPhase::Routed;
        }
    }

    /// Move to the next step, or to `completed` after the last one.
    /// Returns the step to run, if any.
    pub fn advance(&mut self) -> Option<Step> {
        let next = match self.phase {
            TurnPhase::Routed => 0,
            TurnPhase::Executing { step_index, .. } => step_index + 1,
            TurnPhase::Received | TurnPhase::Completed | TurnPhase::Failed => return None,
        };

        match self.steps.get(next) {
            Some(step) => {
                self.phase = TurnPhase::Executing {
                    step_index: next,
                    step: *step,
                };
                Some(*step)
            }
            None => {
                self.phase = TurnPhase::Completed;
                None
            }
        }
    }

    pub fn fail(&mut self) {
        self.phase = TurnPhase::Failed;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, TurnPhase::Completed | TurnPhase::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.phase == TurnPhase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::router::steps_for;
    use crate::state::RoutingAction;

    #[test]
    fn test_pipeline_walks_routed_steps() {
        let mut pipeline = TurnPipeline::new();
        assert_eq!(pipeline.phase(), TurnPhase::Received);
        assert_eq!(pipeline.advance(), None, "cannot execute before routing");

        pipeline.route(steps_for(RoutingAction::WeatherOnly));
        assert_eq!(pipeline.phase(), TurnPhase::Routed);

        assert_eq!(pipeline.advance(), Some(Step::Weather));
        assert_eq!(
            pipeline.phase(),
            TurnPhase::Executing {
                step_index: 0,
                step: Step::Weather
            }
        );
        assert_eq!(pipeline.advance(), Some(Step::Conversation));
        assert_eq!(pipeline.advance(), None);
        assert!(pipeline.is_success());
        assert_eq!(pipeline.advance(), None);
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut pipeline = TurnPipeline::new();
        pipeline.route(steps_for(RoutingAction::ConversationOnly));
        pipeline.advance();
        pipeline.fail();
        assert!(pipeline.is_terminal());
        assert!(!pipeline.is_success());
        assert_eq!(pipeline.advance(), None);
    }

    #[test]
    fn test_phase_serializes_with_tag() {
        let json = serde_json::to_value(TurnPhase::Executing {
            step_index: 2,
            step: Step::Design,
        })
        .unwrap();
        assert_eq!(json["phase"], "executing");
        assert_eq!(json["step"], "design");
    }
}
