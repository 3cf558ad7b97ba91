//! The completion provider seam and its request/response types.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CompletionError;
use crate::llm::json::extract_json;
use crate::llm::usage::TokenUsage;

/// Cost tier of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// Cheap classification model (Pass 1).
    Fast,
    /// Expensive model for detailed analysis and synthesis.
    Detailed,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Detailed => "detailed",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionOptions {
    /// Appended to the provider's system prompt.
    pub system_prompt: Option<String>,
}

impl CompletionOptions {
    /// Options for requests whose answer must be a bare JSON object.
    pub fn structured() -> Self {
        Self {
            system_prompt: Some(
                "Respond with a single JSON object only. No markdown fences, no commentary."
                    .to_string(),
            ),
        }
    }
}

/// Free-text completion with its usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// JSON completion with its usage.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredCompletion {
    pub data: Value,
    pub usage: TokenUsage,
}

impl StructuredCompletion {
    /// Deserialize the payload into a typed response.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, CompletionError> {
        serde_json::from_value(self.data.clone()).map_err(CompletionError::UnexpectedShape)
    }
}

/// Something that turns prompts into model output.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        tier: ModelTier,
        options: &CompletionOptions,
    ) -> Result<Completion, CompletionError>;

    /// Complete and recover a JSON object from the response text.
    ///
    /// Fails with `CompletionError::MalformedResponse` when the text holds no
    /// parseable object.
    async fn complete_structured(
        &self,
        prompt: &str,
        tier: ModelTier,
    ) -> Result<StructuredCompletion, CompletionError> {
        let completion = self
            .complete(prompt, tier, &CompletionOptions::structured())
            .await?;
        into_structured(completion)
    }
}

fn into_structured(
    completion: Completion,
) -> Result<StructuredCompletion, CompletionError> {
    match extract_json(&completion.text) {
        Some(data) => Ok(StructuredCompletion {
            data,
            usage: completion.usage,
        }),
        None => Err(CompletionError::MalformedResponse {
            reason: "no JSON object found".to_string(),
            raw_output: completion.text.chars().take(500).collect(),
            usage: completion.usage,
        }),
    }
}
