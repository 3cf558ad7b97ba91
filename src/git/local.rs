//! `CommitSource` over a local repository.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{Oid, Repository, Sort};
use tracing::debug;

use crate::error::{GitError, SourceError};
use crate::model::{ChangeStats, Commit, CommitDetail, Comparison, RepoRef};
use crate::source::{CommitFilter, CommitSource};

use super::commits::{commit_files, to_commit, tree_files};

/// Commit source reading a repository on disk.
///
/// The `repo` argument of the trait methods is only used for log context;
/// every call reads the repository at `path`.
#[derive(Debug, Clone)]
pub struct LocalSource {
    path: PathBuf,
}

impl LocalSource {
    /// Open the repository at `path` (or the one containing it).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path.as_ref()).map_err(GitError::OpenRepository)?;
        let path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the repository by its `origin` remote, falling back to the
    /// directory name under a `local` owner.
    pub fn repo_ref(&self) -> RepoRef {
        let from_origin = Repository::open(&self.path).ok().and_then(|repo| {
            let remote = repo.find_remote("origin").ok()?;
            remote.url()?.parse::<RepoRef>().ok()
        });

        from_origin.unwrap_or_else(|| {
            let name = self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "repository".to_string());
            RepoRef::new("local", name)
        })
    }

    /// Run a blocking git2 operation against a freshly opened repository.
    async fn with_repo<T, F>(&self, op: F) -> Result<T, GitError>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> Result<T, GitError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<T, GitError> {
            let repo = Repository::open(&path).map_err(GitError::OpenRepository)?;
            op(&repo)
        })
        .await
        .map_err(|e| GitError::TaskFailed(e.to_string()))?
    }
}

fn find_commit<'r>(repo: &'r Repository, sha: &str) -> Result<git2::Commit<'r>, GitError> {
    repo.revparse_single(sha)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| GitError::CommitNotFound(sha.to_string(), e))
}

fn list_matching(repo: &Repository, filter: &CommitFilter) -> Result<Vec<Commit>, GitError> {
    if repo
        .head()
        .is_err_and(|e| e.code() == git2::ErrorCode::UnbornBranch)
    {
        return Ok(Vec::new());
    }

    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TIME)
        .map_err(GitError::RevwalkError)?;
    revwalk.push_head().map_err(GitError::RevwalkError)?;

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid.map_err(GitError::RevwalkError)?;
        let git_commit = repo
            .find_commit(oid)
            .map_err(|e| GitError::CommitNotFound(oid.to_string(), e))?;
        let mut commit = to_commit(&git_commit)?;

        if !filter.contains_date(commit.date) {
            continue;
        }
        if let Some(author) = &filter.author
            && !commit.author.matches(author)
        {
            continue;
        }

        commit.files = commit_files(repo, &git_commit, false)?;
        commit.stats = Some(ChangeStats::from_files(&commit.files));
        commits.push(commit);
    }

    Ok(commits)
}

fn compare(repo: &Repository, base: &str, head: &str) -> Result<Comparison, SourceError> {
    let unavailable = |reason: String| SourceError::ComparisonUnavailable {
        base: base.to_string(),
        head: head.to_string(),
        reason,
    };

    let base_commit = find_commit(repo, base).map_err(|e| unavailable(e.to_string()))?;
    let head_commit = find_commit(repo, head).map_err(|e| unavailable(e.to_string()))?;
    let (base_id, head_id) = (base_commit.id(), head_commit.id());

    repo.merge_base(base_id, head_id)
        .map_err(|e| unavailable(format!("no common ancestor: {}", e.message())))?;

    let (ahead_by, behind_by) = repo
        .graph_ahead_behind(head_id, base_id)
        .map_err(|e| unavailable(e.message().to_string()))?;

    let base_tree = base_commit.tree().map_err(GitError::DiffFailed)?;
    let head_tree = head_commit.tree().map_err(GitError::DiffFailed)?;
    let files = tree_files(repo, Some(&base_tree), &head_tree, true)?;
    let stats = ChangeStats::from_files(&files);

    Ok(Comparison {
        files,
        stats,
        total_commits: count_between(repo, base_id, head_id)?,
        ahead_by,
        behind_by,
    })
}

fn count_between(repo: &Repository, base: Oid, head: Oid) -> Result<usize, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk.push(head).map_err(GitError::RevwalkError)?;
    revwalk.hide(base).map_err(GitError::RevwalkError)?;
    Ok(revwalk.count())
}

#[async_trait]
impl CommitSource for LocalSource {
    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
    ) -> Result<Vec<Commit>, SourceError> {
        let filter = filter.clone();
        let commits = self
            .with_repo(move |r| list_matching(r, &filter))
            .await?;
        debug!("Read {} commits from {} ({})", commits.len(), repo, self.path.display());
        Ok(commits)
    }

    async fn get_commit_detail(
        &self,
        _repo: &RepoRef,
        sha: &str,
    ) -> Result<CommitDetail, SourceError> {
        let sha = sha.to_string();
        let detail = self
            .with_repo(move |r| {
                let commit = find_commit(r, &sha)?;
                let files = commit_files(r, &commit, true)?;
                let stats = ChangeStats::from_files(&files);
                Ok(CommitDetail { files, stats })
            })
            .await?;
        Ok(detail)
    }

    async fn compare_commits(
        &self,
        _repo: &RepoRef,
        base: &str,
        head: &str,
    ) -> Result<Comparison, SourceError> {
        let (base, head) = (base.to_string(), head.to_string());
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<Comparison, SourceError> {
            let repo = Repository::open(&path).map_err(GitError::OpenRepository)?;
            compare(&repo, &base, &head)
        })
        .await
        .map_err(|e| GitError::TaskFailed(e.to_string()))?
    }
}
