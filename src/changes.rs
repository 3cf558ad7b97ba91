//! Change extraction for a batch: one commit's detail, a range comparison,
//! or the commit messages alone when the provider cannot supply either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::batch::Batch;
use crate::model::{ChangeStats, Commit, FileChange, RepoRef};
use crate::source::CommitSource;

/// One commit of a messages-only change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLine {
    pub sha: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

impl From<&Commit> for CommitLine {
    fn from(commit: &Commit) -> Self {
        CommitLine {
            sha: commit.sha.clone(),
            message: commit.message.clone(),
            date: commit.date,
        }
    }
}

/// The code changes behind a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeSet {
    /// File detail for a one-commit batch.
    Single {
        sha: String,
        message: String,
        files: Vec<FileChange>,
        stats: ChangeStats,
    },
    /// Aggregate diff across the batch, oldest to newest commit.
    Range {
        base: String,
        head: String,
        files: Vec<FileChange>,
        stats: ChangeStats,
        commit_count: usize,
    },
    /// Fallback when no diff could be obtained.
    MessagesOnly { commits: Vec<CommitLine> },
}

impl ChangeSet {
    fn messages_only(batch: &Batch) -> Self {
        ChangeSet::MessagesOnly {
            commits: batch.commits.iter().map(CommitLine::from).collect(),
        }
    }

    /// Files carried by this change set (empty for messages only).
    pub fn files(&self) -> &[FileChange] {
        match self {
            ChangeSet::Single { files, .. } | ChangeSet::Range { files, .. } => files,
            ChangeSet::MessagesOnly { .. } => &[],
        }
    }

    pub fn stats(&self) -> Option<ChangeStats> {
        match self {
            ChangeSet::Single { stats, .. } | ChangeSet::Range { stats, .. } => Some(*stats),
            ChangeSet::MessagesOnly { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeSet::Single { .. } => "single",
            ChangeSet::Range { .. } => "range",
            ChangeSet::MessagesOnly { .. } => "messages_only",
        }
    }
}

/// Gather the changes behind a batch.
///
/// Returns `None` only for an empty batch. Provider failures never escape:
/// they degrade to [`ChangeSet::MessagesOnly`].
pub async fn extract_changes(
    source: &dyn CommitSource,
    repo: &RepoRef,
    batch: &Batch,
) -> Option<ChangeSet> {
    let (newest, oldest) = (batch.newest()?, batch.oldest()?);

    if batch.len() == 1 {
        return match source.get_commit_detail(repo, &newest.sha).await {
            Ok(detail) => Some(ChangeSet::Single {
                sha: newest.sha.clone(),
                message: newest.message.clone(),
                files: detail.files,
                stats: detail.stats,
            }),
            Err(e) => {
                warn!(
                    "Commit detail for {} unavailable, using messages only: {}",
                    newest.short_sha(),
                    e
                );
                Some(ChangeSet::messages_only(batch))
            }
        };
    }

    match source.compare_commits(repo, &oldest.sha, &newest.sha).await {
        Ok(comparison) => {
            debug!(
                "Compared {}...{}: {} files",
                oldest.short_sha(),
                newest.short_sha(),
                comparison.files.len()
            );
            Some(ChangeSet::Range {
                base: oldest.sha.clone(),
                head: newest.sha.clone(),
                files: comparison.files,
                stats: comparison.stats,
                commit_count: batch.len(),
            })
        }
        Err(e) => {
            warn!("{}; using messages only", e);
            Some(ChangeSet::messages_only(batch))
        }
    }
}
