//! gitlore - turns commit history into factual, technical write-ups of contribution work.
//!
//! # Overview
//!
//! gitlore reads a user's commits from GitHub or a local repository, groups them
//! into feature-sized batches, classifies every batch with a fast model, escalates
//! the important ones to a detailed model together with their diffs, and
//! synthesizes a narrative summary. Remote failures degrade individual results
//! instead of aborting the run.

pub mod analysis;
pub mod batch;
pub mod changes;
pub mod claude;
pub mod error;
pub mod git;
pub mod github;
pub mod llm;
pub mod model;
pub mod source;

// Re-export commonly used types
pub use analysis::{
    AggregateStats, Analysis, AnalysisRun, IMPORTANCE_THRESHOLD, Summary, analyze_batches,
    get_stats, summarize,
};
pub use batch::{Batch, BatchOptions, Category, batch_commits, categorize};
pub use changes::{ChangeSet, CommitLine, extract_changes};
pub use error::{
    ClaudeError, CompletionError, ConfigError, GitError, GitHubError, SourceError,
};
pub use llm::{CompletionProvider, ModelTier, TokenUsage};
pub use model::{Commit, CommitAuthor, RepoMeta, RepoRef};
pub use source::{CommitFilter, CommitSource};
