//! # Turn Orchestrator
//!
//! Runs one user turn: supervisor, routed steps, conversation, then the
//! thread append. Step failures degrade the turn; only a thread store
//! failure or a conversation failure fails it.

use crate::config::StylistConfig;
use crate::error::{StepError, TurnError};
use crate::memory::ThreadStore;
use crate::skills::llm_helpers::non_empty;
use crate::skills::{
    ConversationSkill, DesignSkill, LanguageModel, SupervisorSkill, WardrobeSkill, WeatherSkill,
};
use crate::state::{
    ConversationThread, Diagnostic, Outfit, RoutingAction, RoutingDecision, Turn, TurnState,
    WeatherData,
};
use crate::tools::{WardrobeSource, WeatherSource};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use super::events::{TurnEvent, TurnEventKind};
use super::pipeline::{TurnPhase, TurnPipeline};
use super::router::{self, Step};

/// Tunables the orchestrator needs from [`StylistConfig`]
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub top_n: usize,
    pub default_location: Option<String>,
    pub llm_timeout: Duration,
    pub weather_timeout: Duration,
    pub wardrobe_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&StylistConfig::default())
    }
}

impl From<&StylistConfig> for OrchestratorConfig {
    fn from(config: &StylistConfig) -> Self {
        Self {
            top_n: config.top_n,
            default_location: config.default_location.clone(),
            llm_timeout: config.llm_timeout(),
            weather_timeout: config.weather_timeout(),
            wardrobe_timeout: config.wardrobe_timeout(),
        }
    }
}

/// The three external collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn LanguageModel>,
    pub weather: Arc<dyn WeatherSource>,
    pub wardrobe: Arc<dyn WardrobeSource>,
}

/// Result of [`Orchestrator::handle_turn`]
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub success: bool,
    pub thread_id: String,
    pub reply: String,
    pub weather_data: Option<WeatherData>,
    pub final_outfit: Option<Outfit>,
    pub routing_action: RoutingAction,
    /// Non-fatal notes, safe to show users
    pub diagnostics: Vec<Diagnostic>,
    pub phase: TurnPhase,
    pub steps: Vec<Step>,
    pub elapsed_ms: u64,
}

pub struct Orchestrator {
    supervisor: SupervisorSkill,
    weather: WeatherSkill,
    wardrobe: WardrobeSkill,
    design: DesignSkill,
    conversation: ConversationSkill,
    threads: Arc<dyn ThreadStore>,
    event_tx: Option<broadcast::Sender<TurnEvent>>,
}

impl Orchestrator {
    pub fn new(
        collaborators: Collaborators,
        threads: Arc<dyn ThreadStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let Collaborators {
            llm,
            weather,
            wardrobe,
        } = collaborators;

        Self {
            supervisor: SupervisorSkill::new(Arc::clone(&llm), config.llm_timeout),
            weather: WeatherSkill::new(
                weather,
                Arc::clone(&llm),
                config.weather_timeout,
                config.llm_timeout,
            )
            .with_default_location(config.default_location),
            wardrobe: WardrobeSkill::new(wardrobe, config.top_n, config.wardrobe_timeout),
            design: DesignSkill::new(Arc::clone(&llm), config.llm_timeout),
            conversation: ConversationSkill::new(llm, config.llm_timeout),
            threads,
            event_tx: None,
        }
    }

    /// Publish [`TurnEvent`]s on a broadcast channel
    pub fn with_event_channel(mut self, tx: broadcast::Sender<TurnEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn threads(&self) -> &Arc<dyn ThreadStore> {
        &self.threads
    }

    fn emit(&self, event: TurnEvent) {
        if let Some(tx) = &self.event_tx {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }

    /// Handle one user message on `thread_id`.
    ///
    /// Never returns an error: turn-level failures come back with
    /// `success: false` and a user-safe reply.
    #[tracing::instrument(
        skip(self, message, location_hint, context_hint),
        fields(message_preview = %message.chars().take(50).collect::<String>())
    )]
    pub async fn handle_turn(
        &self,
        thread_id: &str,
        message: &str,
        location_hint: Option<&str>,
        context_hint: Option<&str>,
    ) -> TurnOutcome {
        let started = Instant::now();
        let mut state = TurnState::new(message);
        let mut pipeline = TurnPipeline::new();
        self.emit(TurnEvent::new(TurnEventKind::TurnStarted, thread_id));

        let result = self
            .execute(
                thread_id,
                location_hint,
                context_hint,
                &mut state,
                &mut pipeline,
            )
            .await;

        let reply = match result {
            Ok(reply) => {
                tracing::info!(
                    action = %state.routing_action(),
                    degraded = state.diagnostics().len(),
                    "Turn completed"
                );
                self.emit(
                    TurnEvent::new(TurnEventKind::TurnCompleted, thread_id)
                        .with_data(json!({ "diagnostics": state.diagnostics().len() })),
                );
                reply
            }
            Err(e) => {
                pipeline.fail();
                tracing::error!(error = %e, kind = %e.kind(), "Turn failed");
                self.emit(
                    TurnEvent::new(TurnEventKind::TurnFailed, thread_id)
                        .with_data(json!({ "kind": e.kind() })),
                );
                e.user_message().to_string()
            }
        };
        debug_assert!(pipeline.is_terminal(), "turn ended in {:?}", pipeline.phase());

        TurnOutcome {
            success: pipeline.is_success(),
            thread_id: thread_id.to_string(),
            reply,
            weather_data: state.weather_data().cloned(),
            final_outfit: state.final_outfit().cloned(),
            routing_action: state.routing_action(),
            diagnostics: state.diagnostics().to_vec(),
            phase: pipeline.phase(),
            steps: pipeline.steps().to_vec(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn execute(
        &self,
        thread_id: &str,
        location_hint: Option<&str>,
        context_hint: Option<&str>,
        state: &mut TurnState,
        pipeline: &mut TurnPipeline,
    ) -> Result<String, TurnError> {
        let history = self.threads.get_or_create(thread_id).await?;

        self.route(thread_id, &history, location_hint, context_hint, state)
            .await?;
        pipeline.route(router::plan(state));
        self.emit(
            TurnEvent::new(TurnEventKind::Routed, thread_id).with_data(json!({
                "action": state.routing_action(),
                "fallback": state.routing().is_some_and(|r| r.fallback),
                "steps": pipeline.steps(),
            })),
        );

        while let Some(step) = pipeline.advance() {
            self.emit(
                TurnEvent::new(TurnEventKind::StepStarted, thread_id).with_step(step.as_str()),
            );
            match step {
                Step::Weather => self.run_weather(thread_id, state).await?,
                Step::Wardrobe => self.run_wardrobe(thread_id, state).await?,
                Step::Design => self.run_design(thread_id, state).await?,
                Step::Conversation => {
                    let reply = self
                        .conversation
                        .run(state, &history)
                        .await
                        .map_err(TurnError::Conversation)?;
                    state.set_reply(reply)?;
                    self.completed(thread_id, step, None);
                }
            }
        }

        let reply = state
            .conversation_reply()
            .map(str::to_string)
            .ok_or_else(|| {
                TurnError::Conversation(StepError::completion("no reply was produced"))
            })?;

        self.threads
            .append(thread_id, vec![Turn::user(state.user_message()), Turn::assistant(&reply)])
            .await?;

        Ok(reply)
    }

    /// Run the supervisor. Hints take precedence over extracted values;
    /// an unusable supervisor response routes to `conversation_only`.
    async fn route(
        &self,
        thread_id: &str,
        history: &ConversationThread,
        location_hint: Option<&str>,
        context_hint: Option<&str>,
        state: &mut TurnState,
    ) -> Result<(), TurnError> {
        let supervised = self.supervisor.run(state.user_message(), history).await;
        let (decision, location, context) = match supervised {
            Ok(plan) => (RoutingDecision::planned(plan.action), plan.location, plan.context),
            Err(e) => {
                tracing::warn!(error = %e, "Supervisor output unusable, falling back");
                self.degrade(thread_id, state, "supervisor", &e);
                (RoutingDecision::fallback(), None, None)
            }
        };

        if let Some(location) = non_empty(location_hint.map(str::to_string)).or(location) {
            state.set_location(location)?;
        }
        if let Some(context) = non_empty(context_hint.map(str::to_string)).or(context) {
            state.set_context(context)?;
        }
        state.set_routing(decision)?;
        Ok(())
    }

    async fn run_weather(&self, thread_id: &str, state: &mut TurnState) -> Result<(), TurnError> {
        let result = self.weather.run(state.extracted_location()).await;
        match result {
            Ok(outcome) => {
                if let Some(e) = &outcome.enrichment_error {
                    state.record(Step::Weather.as_str(), e);
                }
                let location = outcome.data.reading.location.clone();
                state.set_weather(outcome.data)?;
                self.completed(thread_id, Step::Weather, Some(json!({ "location": location })));
            }
            Err(e) => self.degrade(thread_id, state, Step::Weather.as_str(), &e),
        }
        Ok(())
    }

    async fn run_wardrobe(&self, thread_id: &str, state: &mut TurnState) -> Result<(), TurnError> {
        let result = self
            .wardrobe
            .run(
                state.weather_data().map(|w| &w.reading),
                state.extracted_context(),
            )
            .await;

        match result {
            Ok(candidates) => {
                let total = candidates.total();
                state.set_candidates(candidates)?;
                if total == 0 {
                    let e = StepError::retrieval_empty("wardrobe returned no candidates");
                    self.degrade(thread_id, state, Step::Wardrobe.as_str(), &e);
                } else {
                    self.completed(thread_id, Step::Wardrobe, Some(json!({ "candidates": total })));
                }
            }
            Err(e) => self.degrade(thread_id, state, Step::Wardrobe.as_str(), &e),
        }
        Ok(())
    }

    async fn run_design(&self, thread_id: &str, state: &mut TurnState) -> Result<(), TurnError> {
        let result = match state.wardrobe_candidates() {
            Some(candidates) => {
                self.design
                    .run(candidates, state.weather_data(), state.extracted_context())
                    .await
            }
            None => Err(StepError::retrieval_empty("wardrobe step produced no candidates")),
        };

        match result {
            Ok(outcome) => {
                if let Some(e) = &outcome.fallback_reason {
                    state.record(Step::Design.as_str(), e);
                }
                let data = json!({
                    "attempts": outcome.attempts,
                    "fallback": outcome.fallback_reason.is_some(),
                    "outfit": outcome.outfit.to_pipe_line(),
                });
                state.set_outfit(outcome.outfit)?;
                self.completed(thread_id, Step::Design, Some(data));
            }
            Err(e) => self.degrade(thread_id, state, Step::Design.as_str(), &e),
        }
        Ok(())
    }

    fn completed(&self, thread_id: &str, step: Step, data: Option<serde_json::Value>) {
        let mut event =
            TurnEvent::new(TurnEventKind::StepCompleted, thread_id).with_step(step.as_str());
        if let Some(data) = data {
            event = event.with_data(data);
        }
        self.emit(event);
    }

    /// Record a step failure and keep going
    fn degrade(&self, thread_id: &str, state: &mut TurnState, stage: &str, error: &StepError) {
        tracing::warn!(stage, kind = %error.kind, detail = %error.message, "Step degraded");
        state.record(stage, error);
        self.emit(
            TurnEvent::new(TurnEventKind::StepDegraded, thread_id)
                .with_step(stage)
                .with_data(json!({ "kind": error.kind })),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StoreError};
    use crate::memory::InMemoryThreadStore;
    use crate::skills::{conversation_skill, design_skill, supervisor_skill, weather_skill};
    use crate::state::Role;
    use crate::testing::{
        one_per_category, paris_reading, FixedWardrobe, FixedWeather, ScriptedModel,
    };
    use async_trait::async_trait;

    const PARIS_PLAN: &str =
        r#"{"action": "full_recommendation", "location": "Paris", "context": null}"#;
    const ANALYSIS: &str = r#"{"weather_analysis": "Cool and rainy", "comfort_level": 3, "key_factors": ["rain"], "recommendations": "Waterproof layers"}"#;

    fn scripted(plan: &str) -> ScriptedModel {
        ScriptedModel::new()
            .respond(supervisor_skill::CONTRACT.name, plan)
            .respond(weather_skill::CONTRACT.name, ANALYSIS)
            .respond(design_skill::CONTRACT.name, "Rain Jacket|Jeans|Boots|Trench Coat|Umbrella")
            .respond(conversation_skill::CONTRACT.name, "Wear the rain jacket and boots.")
    }

    fn build(
        llm: ScriptedModel,
        weather: FixedWeather,
        threads: Arc<dyn ThreadStore>,
    ) -> (Orchestrator, Arc<ScriptedModel>) {
        let llm = Arc::new(llm);
        let collaborators = Collaborators {
            llm: llm.clone(),
            weather: Arc::new(weather),
            wardrobe: Arc::new(FixedWardrobe::ok(one_per_category())),
        };
        (
            Orchestrator::new(collaborators, threads, OrchestratorConfig::default()),
            llm,
        )
    }

    fn memory() -> Arc<dyn ThreadStore> {
        Arc::new(InMemoryThreadStore::new(100))
    }

    #[tokio::test]
    async fn test_paris_full_recommendation() {
        let (orchestrator, _) =
            build(scripted(PARIS_PLAN), FixedWeather::ok(paris_reading()), memory());
        let outcome = orchestrator
            .handle_turn("t1", "What should I wear in Paris today?", None, None)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.routing_action, RoutingAction::FullRecommendation);
        assert_eq!(outcome.phase, TurnPhase::Completed);
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

        let weather = outcome.weather_data.unwrap();
        assert_eq!(weather.reading.location, "Paris");
        assert_eq!(weather.reading.temperature, 15.0);
        assert_eq!(weather.reading.description, "rain");

        let outfit = outcome.final_outfit.unwrap();
        assert_eq!(outfit.top.as_ref().unwrap().name, "Rain Jacket");
        assert_eq!(outfit.bottom.as_ref().unwrap().name, "Jeans");
        assert_eq!(outfit.footwear.as_ref().unwrap().name, "Boots");
        assert_eq!(outfit.outerwear.as_ref().unwrap().name, "Trench Coat");
        assert_eq!(outfit.accessory_names(), vec!["Umbrella"]);

        let history = orchestrator.threads().history("t1").await.unwrap().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.turns[0].content, "What should I wear in Paris today?");
        assert_eq!(history.turns[1].content, "Wear the rain jacket and boots.");
    }

    #[tokio::test]
    async fn test_weather_failure_degrades() {
        let (orchestrator, _) = build(scripted(PARIS_PLAN), FixedWeather::failing(), memory());
        let outcome = orchestrator.handle_turn("t1", "Outfit for Paris?", None, None).await;

        assert!(outcome.success);
        assert!(outcome.weather_data.is_none());
        assert!(!outcome.reply.is_empty());
        assert!(outcome.final_outfit.is_some(), "later steps still run");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].stage, "weather");
        assert_eq!(outcome.diagnostics[0].kind, ErrorKind::LookupError);
        assert!(!outcome.diagnostics[0].note.contains("unreachable"));
    }

    #[tokio::test]
    async fn test_malformed_design_retries_once_then_falls_back() {
        let llm = scripted(PARIS_PLAN)
            .respond(design_skill::CONTRACT.name, "Rain Jacket|Jeans|Boots|Umbrella");
        let (orchestrator, llm) = build(llm, FixedWeather::ok(paris_reading()), memory());
        let outcome = orchestrator
            .handle_turn("t1", "What should I wear in Paris?", None, None)
            .await;

        assert!(outcome.success);
        assert_eq!(llm.calls(design_skill::CONTRACT.name), 2);
        let outfit = outcome.final_outfit.unwrap();
        assert_eq!(outfit, Outfit::fallback(&one_per_category()));
        assert!(outfit.outerwear.is_none());
        assert!(outfit.accessories.is_empty());
        assert_eq!(outcome.diagnostics[0].stage, "design");
        assert_eq!(outcome.diagnostics[0].kind, ErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let (orchestrator, _) =
            build(scripted(PARIS_PLAN), FixedWeather::ok(paris_reading()), memory());
        let message = "What should I wear in Paris today?";
        let first = orchestrator.handle_turn("t1", message, None, None).await;
        let second = orchestrator.handle_turn("t1", message, None, None).await;

        assert_eq!(first.routing_action, second.routing_action);
        assert_eq!(first.final_outfit, second.final_outfit);
        assert_eq!(orchestrator.threads().history("t1").await.unwrap().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_malformed_supervisor_falls_back_to_conversation() {
        let (orchestrator, llm) = build(
            scripted("I think they want an outfit"),
            FixedWeather::ok(paris_reading()),
            memory(),
        );
        let outcome = orchestrator.handle_turn("t1", "uh", None, None).await;

        assert!(outcome.success);
        assert_eq!(outcome.routing_action, RoutingAction::ConversationOnly);
        assert_eq!(outcome.steps, vec![Step::Conversation]);
        assert_eq!(outcome.diagnostics[0].kind, ErrorKind::ParseError);
        assert_eq!(llm.calls(design_skill::CONTRACT.name), 0);
        assert!(llm
            .last_prompt(conversation_skill::CONTRACT.name)
            .unwrap()
            .contains("clarifying question"));
    }

    #[tokio::test]
    async fn test_routes_run_only_their_steps() {
        let plan = r#"{"action": "weather_only", "location": "Tokyo", "context": null}"#;
        let weather = FixedWeather::ok(paris_reading());
        let lookups = weather.calls();
        let (orchestrator, llm) = build(scripted(plan), weather, memory());
        let outcome = orchestrator.handle_turn("t1", "Weather in Tokyo?", None, None).await;

        assert_eq!(outcome.steps, vec![Step::Weather, Step::Conversation]);
        assert_eq!(outcome.weather_data.unwrap().reading.location, "Tokyo");
        assert!(outcome.final_outfit.is_none());
        assert_eq!(lookups.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(llm.calls(design_skill::CONTRACT.name), 0);

        let plan = r#"{"action": "chitchat", "location": null, "context": null}"#;
        let (orchestrator, llm) =
            build(scripted(plan), FixedWeather::ok(paris_reading()), memory());
        let outcome = orchestrator.handle_turn("t1", "Hi!", None, None).await;
        assert_eq!(outcome.steps, vec![Step::Conversation]);
        assert_eq!(llm.calls(weather_skill::CONTRACT.name), 0);
    }

    #[tokio::test]
    async fn test_hints_take_precedence() {
        let (orchestrator, _) =
            build(scripted(PARIS_PLAN), FixedWeather::ok(paris_reading()), memory());
        let outcome = orchestrator
            .handle_turn("t1", "What should I wear in Paris?", Some("London"), Some("office"))
            .await;
        assert_eq!(outcome.weather_data.unwrap().reading.location, "London");
    }

    #[tokio::test]
    async fn test_conversation_failure_fails_turn() {
        let llm = scripted(PARIS_PLAN).fail(
            conversation_skill::CONTRACT.name,
            StepError::completion("upstream 500: internal trace id 42"),
        );
        let (orchestrator, _) = build(llm, FixedWeather::ok(paris_reading()), memory());
        let outcome = orchestrator.handle_turn("t1", "What should I wear?", None, None).await;

        assert!(!outcome.success);
        assert_eq!(outcome.phase, TurnPhase::Failed);
        assert!(!outcome.reply.contains("trace id"));
        assert!(orchestrator.threads().history("t1").await.unwrap().unwrap().is_empty());
    }

    struct BrokenStore;

    #[async_trait]
    impl ThreadStore for BrokenStore {
        async fn get_or_create(&self, _: &str) -> Result<ConversationThread, StoreError> {
            Err(StoreError::Lock("poisoned".to_string()))
        }
        async fn history(&self, _: &str) -> Result<Option<ConversationThread>, StoreError> {
            Err(StoreError::Lock("poisoned".to_string()))
        }
        async fn append(&self, _: &str, _: Vec<Turn>) -> Result<(), StoreError> {
            Err(StoreError::Lock("poisoned".to_string()))
        }
        async fn clear(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Lock("poisoned".to_string()))
        }
    }

    #[tokio::test]
    async fn test_thread_store_failure_fails_turn() {
        let (orchestrator, llm) = build(
            scripted(PARIS_PLAN),
            FixedWeather::ok(paris_reading()),
            Arc::new(BrokenStore),
        );
        let outcome = orchestrator.handle_turn("t1", "hello", None, None).await;

        assert!(!outcome.success);
        assert!(!outcome.reply.contains("poisoned"));
        assert_eq!(llm.calls(supervisor_skill::CONTRACT.name), 0);
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_one_thread_stay_ordered() {
        let (orchestrator, _) =
            build(scripted(PARIS_PLAN), FixedWeather::ok(paris_reading()), memory());
        let orchestrator = Arc::new(orchestrator);

        let mut handles = Vec::new();
        for i in 0..16 {
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                orchestrator
                    .handle_turn("shared", &format!("message {}", i), None, None)
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().success);
        }

        let thread = orchestrator.threads().history("shared").await.unwrap().unwrap();
        assert_eq!(thread.len(), 32);
        let mut seen = Vec::new();
        for pair in thread.turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            seen.push(pair[0].content.clone());
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 16);
    }

    #[tokio::test]
    async fn test_events_follow_the_turn() {
        let (tx, mut rx) = broadcast::channel(64);
        let plan = r#"{"action": "wardrobe_only", "location": null, "context": "green shirt"}"#;
        let (orchestrator, _) = build(scripted(plan), FixedWeather::ok(paris_reading()), memory());
        let orchestrator = orchestrator.with_event_channel(tx);

        let outcome = orchestrator.handle_turn("t1", "Would a green shirt work?", None, None).await;
        assert!(outcome.success);

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                TurnEventKind::TurnStarted,
                TurnEventKind::Routed,
                TurnEventKind::StepStarted,
                TurnEventKind::StepCompleted,
                TurnEventKind::StepStarted,
                TurnEventKind::StepCompleted,
                TurnEventKind::TurnCompleted,
            ]
        );
    }

    #[tokio::test]
    async fn test_design_event_carries_outfit_line() {
        let (tx, mut rx) = broadcast::channel(64);
        let (orchestrator, _) =
            build(scripted(PARIS_PLAN), FixedWeather::ok(paris_reading()), memory());
        let orchestrator = orchestrator.with_event_channel(tx);
        orchestrator.handle_turn("t1", "Outfit for Paris?", None, None).await;

        let mut design = None;
        while let Ok(event) = rx.try_recv() {
            let is_design = event.step.as_deref() == Some(Step::Design.as_str());
            if event.kind == TurnEventKind::StepCompleted && is_design {
                design = event.data;
            }
        }
        let data = design.unwrap();
        assert_eq!(data["outfit"], "Rain Jacket|Jeans|Boots|Trench Coat|Umbrella");
        assert_eq!(data["attempts"], 1);
    }

    #[tokio::test]
    async fn test_empty_wardrobe_is_degraded_not_failed() {
        let llm = Arc::new(scripted(PARIS_PLAN));
        let collaborators = Collaborators {
            llm: llm.clone(),
            weather: Arc::new(FixedWeather::ok(paris_reading())),
            wardrobe: Arc::new(FixedWardrobe::ok(crate::state::WardrobeCandidates::new())),
        };
        let orchestrator =
            Orchestrator::new(collaborators, memory(), OrchestratorConfig::default());
        let outcome = orchestrator.handle_turn("t1", "Outfit for Paris?", None, None).await;

        assert!(outcome.success);
        assert!(outcome.final_outfit.is_none());
        let stages: Vec<_> = outcome
            .diagnostics
            .iter()
            .map(|d| (d.stage.as_str(), d.kind))
            .collect();
        assert_eq!(
            stages,
            vec![
                ("wardrobe", ErrorKind::RetrievalEmpty),
                ("design", ErrorKind::RetrievalEmpty)
            ]
        );
        assert_eq!(llm.calls(design_skill::CONTRACT.name), 0);
        assert!(outcome.weather_data.is_some());
    }
}
