//! # Language Model Collaborator
//!
//! Steps describe what they expect back with a [`ResponseContract`] and
//! receive raw text; decoding against the contract is the caller's job.

use crate::error::{StepError, StepResult};
use crate::models::ModelConfig;
use crate::run_llm_function;
use async_trait::async_trait;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shape the caller will parse the response as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A single JSON object
    Json,
    /// One line of `|`-separated fields, in this order
    PipeDelimited { fields: &'static [&'static str] },
    /// Plain prose
    FreeText,
}

impl ResponseShape {
    /// Format instruction appended to the prompt
    pub fn instruction(&self) -> String {
        match self {
            ResponseShape::Json => {
                "Respond ONLY with a valid JSON object. Do not include any text before or after it."
                    .to_string()
            }
            ResponseShape::PipeDelimited { fields } => format!(
                "Respond with exactly one line of {} fields separated by '|': {}. No other text.",
                fields.len(),
                fields.join("|")
            ),
            ResponseShape::FreeText => "Respond in plain conversational text.".to_string(),
        }
    }
}

/// What a step asks of the language model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseContract {
    /// Stable identifier, used in logs and by test stubs
    pub name: &'static str,
    pub system_prompt: &'static str,
    pub shape: ResponseShape,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, contract: &ResponseContract, prompt: &str) -> StepResult<String>;
}

/// Raw completion text. radkit decodes every response into a typed output,
/// so free-form responses travel in a one-field object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct Completion {
    /// The complete response, formatted as the prompt instructs
    pub text: String,
}

/// Production language model backed by radkit providers
pub struct RadkitLanguageModel {
    config: ModelConfig,
}

impl RadkitLanguageModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    async fn run(&self, system_prompt: &'static str, input: String) -> anyhow::Result<Completion> {
        run_llm_function!(&self.config, Completion, system_prompt, input)
    }
}

#[async_trait]
impl LanguageModel for RadkitLanguageModel {
    async fn complete(&self, contract: &ResponseContract, prompt: &str) -> StepResult<String> {
        let input = format!("{}\n\n{}", prompt, contract.shape.instruction());
        tracing::debug!(
            contract = contract.name,
            provider = %self.config.provider.display_name(),
            model = %self.config.model,
            "Requesting completion"
        );

        match self.run(contract.system_prompt, input).await {
            Ok(completion) => Ok(completion.text),
            Err(e) => {
                tracing::warn!(contract = contract.name, error = %e, "Completion failed");
                Err(StepError::completion(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_instruction_lists_fields() {
        let shape = ResponseShape::PipeDelimited {
            fields: &["top", "bottom", "footwear", "outerwear", "accessories"],
        };
        let text = shape.instruction();
        assert!(text.contains("exactly one line of 5 fields"));
        assert!(text.contains("top|bottom|footwear|outerwear|accessories"));
    }

    #[test]
    fn test_json_instruction() {
        assert!(ResponseShape::Json.instruction().contains("JSON object"));
    }
}
