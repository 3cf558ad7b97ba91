//! `CompletionProvider` backed by the Claude Code CLI.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ClaudeError, CompletionError};
use crate::llm::retry::{RetryPolicy, retry_with_backoff};
use crate::llm::{Completion, CompletionOptions, CompletionProvider, ModelTier, TokenUsage};

use super::subprocess::{ClaudeInvocation, run_claude};

pub const DEFAULT_FAST_MODEL: &str = "haiku";
pub const DEFAULT_DETAILED_MODEL: &str = "sonnet";

/// Model names used for each tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub fast: String,
    pub detailed: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_MODEL.to_string(),
            detailed: DEFAULT_DETAILED_MODEL.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Detailed => &self.detailed,
        }
    }
}

/// Trait for executing Claude CLI invocations.
///
/// This abstraction allows mocking the Claude subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    /// Run Claude and return the raw stdout envelope.
    async fn run(
        &self,
        prompt: &str,
        model: &str,
        system_prompt: Option<String>,
    ) -> Result<String, ClaudeError>;
}

/// Executor that spawns the real Claude CLI.
pub struct DefaultExecutor;

#[async_trait]
impl ClaudeExecutor for DefaultExecutor {
    async fn run(
        &self,
        prompt: &str,
        model: &str,
        system_prompt: Option<String>,
    ) -> Result<String, ClaudeError> {
        run_claude(&ClaudeInvocation {
            prompt,
            model,
            system_prompt: system_prompt.as_deref(),
        })
        .await
    }
}

/// Claude CLI JSON envelope produced by `--output-format json`.
#[derive(Deserialize)]
struct ClaudeEnvelope {
    result: String,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    usage: TokenUsage,
}

/// Completion provider that shells out to `claude -p`.
pub struct ClaudeProvider<E = DefaultExecutor> {
    models: ModelConfig,
    retry: RetryPolicy,
    executor: E,
}

impl ClaudeProvider<DefaultExecutor> {
    pub fn new(models: ModelConfig) -> Self {
        Self::with_executor(models, DefaultExecutor)
    }
}

impl<E: ClaudeExecutor> ClaudeProvider<E> {
    pub fn with_executor(models: ModelConfig, executor: E) -> Self {
        Self {
            models,
            retry: RetryPolicy::default(),
            executor,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    async fn try_complete(
        &self,
        prompt: &str,
        model: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, ClaudeError> {
        let stdout = self
            .executor
            .run(prompt, model, options.system_prompt.clone())
            .await?;
        parse_envelope(&stdout)
    }
}

#[async_trait]
impl<E: ClaudeExecutor> CompletionProvider for ClaudeProvider<E> {
    async fn complete(
        &self,
        prompt: &str,
        tier: ModelTier,
        options: &CompletionOptions,
    ) -> Result<Completion, CompletionError> {
        let model = self.models.model_for(tier);
        debug!("Requesting {} completion from {}", tier, model);

        let completion = retry_with_backoff(
            self.retry,
            || self.try_complete(prompt, model, options),
            |e| !matches!(e, ClaudeError::NotInstalled | ClaudeError::SpawnFailed(_)),
            |e| ClaudeError::RetriesExhausted(Box::new(e)),
        )
        .await?;

        Ok(completion)
    }
}

/// Parse the CLI envelope into response text and usage.
///
/// Output that is not an envelope is treated as raw response text with no
/// usage information.
fn parse_envelope(stdout: &str) -> Result<Completion, ClaudeError> {
    match serde_json::from_str::<ClaudeEnvelope>(stdout.trim()) {
        Ok(envelope) if envelope.is_error => Err(ClaudeError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(Completion {
            text: envelope.result,
            usage: envelope.usage,
        }),
        Err(_) if stdout.trim().is_empty() => Err(ClaudeError::InvalidEnvelope(
            "empty output".to_string(),
        )),
        Err(_) => Ok(Completion {
            text: stdout.trim().to_string(),
            usage: TokenUsage::default(),
        }),
    }
}
