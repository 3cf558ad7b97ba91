//! Commit records and repository references shared by every pipeline stage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GitHubError;

/// Identity of a commit author as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    /// Hosting-service login, when the provider could associate one.
    pub login: Option<String>,
}

impl CommitAuthor {
    /// Whether this author matches a filter value (login, name, or email).
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.login
            .as_deref()
            .is_some_and(|l| l.to_lowercase() == needle)
            || self.name.to_lowercase() == needle
            || self.email.to_lowercase() == needle
    }
}

/// Status of a file within a commit or comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Other,
}

impl FileStatus {
    /// Map a GitHub `status` string onto a file status.
    pub fn from_api(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "modified" | "changed" => FileStatus::Modified,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Other,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
            FileStatus::Other => "changed",
        };
        f.write_str(s)
    }
}

/// Per-file change statistics, optionally with the unified patch text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// Aggregate line statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub additions: u64,
    pub deletions: u64,
    pub total: u64,
}

impl ChangeStats {
    /// Sum the per-file counts of a file list.
    pub fn from_files(files: &[FileChange]) -> Self {
        let additions = files.iter().map(|f| f.additions).sum();
        let deletions = files.iter().map(|f| f.deletions).sum();
        Self {
            additions,
            deletions,
            total: additions + deletions,
        }
    }
}

/// A commit as ingested from a provider. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub author: CommitAuthor,
    pub message: String,
    /// Authorship timestamp.
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ChangeStats>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileChange>,
}

impl Commit {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    /// Abbreviated hash for display.
    pub fn short_sha(&self) -> &str {
        &self.sha[..self.sha.len().min(7)]
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Full file-level detail for a single commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitDetail {
    pub files: Vec<FileChange>,
    pub stats: ChangeStats,
}

/// Result of comparing two commits (`base...head`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    pub files: Vec<FileChange>,
    pub stats: ChangeStats,
    pub total_commits: usize,
    pub ahead_by: usize,
    pub behind_by: usize,
}

/// Reference to a repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = GitHubError;

    /// Accepts `owner/name`, `git@github.com:owner/name.git`, and
    /// `https://github.com/owner/name(.git)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GitHubError::InvalidRepositoryRef(s.to_string());
        let trimmed = s.trim();

        let path = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
            rest
        } else if let Some((_, rest)) = trimmed.split_once("github.com/") {
            rest
        } else if trimmed.contains("://") || trimmed.contains('@') {
            return Err(invalid());
        } else {
            trimmed
        };

        let path = path.strip_suffix(".git").unwrap_or(path);
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        match (parts.next(), parts.next()) {
            (Some(owner), Some(name)) => Ok(RepoRef::new(owner, name)),
            _ => Err(invalid()),
        }
    }
}

/// Descriptive repository metadata used by the final synthesis prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMeta {
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl RepoMeta {
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Default::default()
        }
    }
}
