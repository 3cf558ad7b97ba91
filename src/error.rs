//! Error types for gitlore modules using thiserror.

use thiserror::Error;

use crate::llm::TokenUsage;

/// Errors from the commit sources (GitHub API or local repository).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Comparison {base}...{head} is unavailable: {reason}")]
    ComparisonUnavailable {
        base: String,
        head: String,
        reason: String,
    },
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Run 'gh auth login' or set GITHUB_TOKEN environment variable"
    )]
    AuthenticationFailed,

    #[error("Failed to build GitHub client: {0}")]
    ClientBuild(#[source] Box<octocrab::Error>),

    #[error("GitHub request failed: {0}")]
    Request(#[source] Box<octocrab::Error>),

    #[error("Rate limited by GitHub API. Resets at: {reset_time}")]
    RateLimited { reset_time: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Invalid repository reference '{0}': expected owner/name or a GitHub URL")]
    InvalidRepositoryRef(String),
}

/// Errors from local git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to find commit '{0}': {1}")]
    CommitNotFound(String, #[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to compute diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Commit {hash} has invalid timestamp (seconds={seconds})")]
    InvalidTimestamp { hash: String, seconds: i64 },

    #[error("Local repository task failed: {0}")]
    TaskFailed(String),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude returned an unreadable envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ClaudeError>),
}

/// Errors surfaced by a completion provider.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    /// The request went through, so its `usage` still counts.
    #[error("Model response contained no parseable JSON payload: {reason}")]
    MalformedResponse {
        reason: String,
        raw_output: String,
        usage: TokenUsage,
    },

    #[error("Model response did not match the expected shape: {0}")]
    UnexpectedShape(#[source] serde_json::Error),
}

impl CompletionError {
    /// Short, single-line description suitable for recording on an analysis.
    pub fn summary(&self) -> String {
        match self {
            CompletionError::Claude(ClaudeError::RetriesExhausted(inner)) => {
                format!("Claude failed after retries: {}", inner)
            }
            CompletionError::Claude(err) => err.to_string(),
            CompletionError::MalformedResponse { reason, .. } => {
                format!("malformed model response ({})", reason)
            }
            CompletionError::UnexpectedShape(err) => format!("unexpected response shape ({})", err),
        }
    }

    /// Tokens consumed by a request that completed but could not be used.
    pub fn usage(&self) -> Option<&TokenUsage> {
        match self {
            CompletionError::MalformedResponse { usage, .. } => Some(usage),
            _ => None,
        }
    }
}

/// Errors from pipeline configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max batch size must be at least 1 (got {0})")]
    InvalidBatchSize(usize),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("date range is empty: since {since} is after until {until}")]
    EmptyDateRange { since: String, until: String },
}
