//! # Supervisor Skill
//!
//! Classifies the user's intent into a routing action and extracts the
//! location and occasion, when mentioned.

use crate::error::{StepError, StepResult};
use crate::state::{ConversationThread, RoutingAction};
use crate::tools::bounded;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::language_model::{LanguageModel, ResponseContract, ResponseShape};
use super::llm_helpers::{decode_json, non_empty};
use super::prompts;

pub const CONTRACT: ResponseContract = ResponseContract {
    name: "supervisor",
    system_prompt: prompts::SUPERVISOR,
    shape: ResponseShape::Json,
};

/// Turns of history shown to the supervisor
const HISTORY_WINDOW: usize = 6;

#[derive(Debug, Deserialize)]
struct SupervisorOutput {
    action: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "followup_context")]
    context: Option<String>,
}

/// Decoded supervisor decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorPlan {
    pub action: RoutingAction,
    pub location: Option<String>,
    pub context: Option<String>,
}

/// Strictly decode a supervisor response; unknown actions are parse errors
pub fn parse_plan(text: &str) -> StepResult<SupervisorPlan> {
    let output: SupervisorOutput = decode_json(text)?;
    let action = output.action.parse::<RoutingAction>().map_err(StepError::parse)?;
    Ok(SupervisorPlan {
        action,
        location: non_empty(output.location),
        context: non_empty(output.context),
    })
}

pub struct SupervisorSkill {
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl SupervisorSkill {
    pub fn new(llm: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn run(
        &self,
        message: &str,
        history: &ConversationThread,
    ) -> StepResult<SupervisorPlan> {
        let prompt = build_prompt(message, history);
        let text = bounded(
            "supervisor completion",
            self.timeout,
            self.llm.complete(&CONTRACT, &prompt),
        )
        .await?;
        parse_plan(&text)
    }
}

fn build_prompt(message: &str, history: &ConversationThread) -> String {
    let recent = history.turns.len().saturating_sub(HISTORY_WINDOW);
    let window = ConversationThread {
        thread_id: history.thread_id.clone(),
        turns: history.turns[recent..].to_vec(),
    };

    if window.is_empty() {
        format!("User: {}", message)
    } else {
        format!(
            "Conversation so far:\n{}\n\nLatest message:\nUser: {}",
            window.transcript(),
            message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::state::Turn;
    use crate::testing::ScriptedModel;

    #[test]
    fn test_parse_plan_accepts_aliases() {
        let plan = parse_plan(
            r#"{"action": "design_followup", "location": null, "followup_context": "green shirt"}"#,
        )
        .unwrap();
        assert_eq!(plan.action, RoutingAction::WardrobeOnly);
        assert_eq!(plan.location, None);
        assert_eq!(plan.context.as_deref(), Some("green shirt"));
    }

    #[test]
    fn test_parse_plan_rejects_unknown_action() {
        let err = parse_plan(r#"{"action": "book_flight"}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);

        let err = parse_plan("full_recommendation please").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_run_includes_history() {
        let llm = Arc::new(ScriptedModel::new().respond(
            CONTRACT.name,
            r#"{"action": "weather_only", "location": "Tokyo", "context": ""}"#,
        ));
        let skill = SupervisorSkill::new(llm.clone(), Duration::from_secs(1));

        let mut history = ConversationThread::new("t1");
        history.append_bounded(vec![Turn::user("Hi"), Turn::assistant("Hello!")], 0);

        let plan = skill.run("Weather in Tokyo?", &history).await.unwrap();
        assert_eq!(plan.action, RoutingAction::WeatherOnly);
        assert_eq!(plan.location.as_deref(), Some("Tokyo"));
        assert_eq!(plan.context, None);

        let prompt = llm.last_prompt(CONTRACT.name).unwrap();
        assert!(prompt.contains("Assistant: Hello!"));
        assert!(prompt.ends_with("User: Weather in Tokyo?"));
    }
}
