//! Completion provider abstraction, JSON recovery, retry, and token accounting.

pub mod json;
pub mod provider;
pub mod retry;
pub mod usage;

pub use json::extract_json;
pub use provider::{
    Completion, CompletionOptions, CompletionProvider, ModelTier, StructuredCompletion,
};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use usage::TokenUsage;
