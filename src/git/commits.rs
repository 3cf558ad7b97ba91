//! Conversion of git2 commits and diffs into commit records.

use chrono::{TimeZone, Utc};
use git2::{Delta, Diff, DiffFindOptions, DiffOptions, Patch, Repository, Tree};

use crate::error::GitError;
use crate::model::{Commit, CommitAuthor, FileChange, FileStatus};

/// Build a commit record from a git2 commit, without file detail.
pub fn to_commit(commit: &git2::Commit) -> Result<Commit, GitError> {
    let sha = commit.id().to_string();
    let seconds = commit.author().when().seconds();
    let date = Utc
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| GitError::InvalidTimestamp {
            hash: sha.clone(),
            seconds,
        })?;

    let author = commit.author();
    Ok(Commit {
        sha,
        author: CommitAuthor {
            name: author.name().unwrap_or_default().to_string(),
            email: author.email().unwrap_or_default().to_string(),
            login: None,
        },
        message: commit.message().unwrap_or_default().to_string(),
        date,
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        stats: None,
        files: Vec::new(),
    })
}

/// Diff a commit against its first parent (or the empty tree for a root commit).
pub fn commit_files(
    repo: &Repository,
    commit: &git2::Commit,
    include_patch: bool,
) -> Result<Vec<FileChange>, GitError> {
    let new_tree = commit.tree().map_err(GitError::DiffFailed)?;
    let old_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree().map_err(GitError::DiffFailed)?),
        Err(_) => None,
    };
    tree_files(repo, old_tree.as_ref(), &new_tree, include_patch)
}

/// Diff two trees into per-file changes with line counts.
pub fn tree_files(
    repo: &Repository,
    old_tree: Option<&Tree>,
    new_tree: &Tree,
    include_patch: bool,
) -> Result<Vec<FileChange>, GitError> {
    let mut opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(old_tree, Some(new_tree), Some(&mut opts))
        .map_err(GitError::DiffFailed)?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))
        .map_err(GitError::DiffFailed)?;

    diff_files(&diff, include_patch)
}

fn diff_files(diff: &Diff<'_>, include_patch: bool) -> Result<Vec<FileChange>, GitError> {
    let mut files = Vec::with_capacity(diff.deltas().len());

    for (idx, delta) in diff.deltas().enumerate() {
        let status = match delta.status() {
            Delta::Added => FileStatus::Added,
            Delta::Deleted => FileStatus::Removed,
            Delta::Modified => FileStatus::Modified,
            Delta::Renamed => FileStatus::Renamed,
            _ => FileStatus::Other,
        };
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (additions, deletions, patch) = match Patch::from_diff(diff, idx)
            .map_err(GitError::DiffFailed)?
        {
            Some(mut patch) => {
                let (_, additions, deletions) = patch.line_stats().map_err(GitError::DiffFailed)?;
                let text = if include_patch {
                    let buf = patch.to_buf().map_err(GitError::DiffFailed)?;
                    buf.as_str().map(str::to_string)
                } else {
                    None
                };
                (additions as u64, deletions as u64, text)
            }
            // Binary files have no textual patch.
            None => (0, 0, None),
        };

        files.push(FileChange {
            path,
            status,
            additions,
            deletions,
            patch,
        });
    }

    Ok(files)
}
