//! Token usage accounting for a single pipeline run.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Tokens consumed by one request, or accumulated over a run.
///
/// A fresh value is created per top-level run and threaded through the
/// pipeline; it only ever grows during that run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    /// Number of requests that reported usage.
    #[serde(default)]
    pub requests: u32,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens
            + self.output_tokens
            + self.cache_read_input_tokens
            + self.cache_creation_input_tokens
    }

    /// Record one request's usage.
    pub fn record(&mut self, request: &TokenUsage) {
        *self += TokenUsage {
            requests: 1,
            ..*request
        };
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
        self.cache_read_input_tokens += rhs.cache_read_input_tokens;
        self.cache_creation_input_tokens += rhs.cache_creation_input_tokens;
        self.requests += rhs.requests;
    }
}
