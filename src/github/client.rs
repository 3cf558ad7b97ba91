//! `CommitSource` over the GitHub REST API via octocrab.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GitHubError, SourceError};
use crate::model::{
    ChangeStats, Commit, CommitAuthor, CommitDetail, Comparison, FileChange, FileStatus, RepoMeta,
    RepoRef,
};
use crate::source::{CommitFilter, CommitSource};

/// GitHub's maximum page size for commit listings.
const DEFAULT_PAGE_SIZE: u8 = 100;

/// Safety limit to prevent runaway pagination.
const MAX_PAGES: u32 = 50;

/// Commit source backed by the GitHub API.
pub struct GitHubSource {
    client: Octocrab,
    page_size: u8,
}

impl GitHubSource {
    /// Build a client authenticated with a personal token.
    pub fn new(token: &str) -> Result<Self, GitHubError> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::ClientBuild(Box::new(e)))?;
        Ok(Self::with_client(client))
    }

    /// Use a pre-configured octocrab client.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_client(client: Octocrab) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the page size (GitHub caps it at 100).
    pub fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    /// Fetch the repository's name, description, and primary language.
    pub async fn fetch_repo_meta(&self, repo: &RepoRef) -> Result<RepoMeta, GitHubError> {
        let route = format!("/repos/{}/{}", repo.owner, repo.name);
        let meta: ApiRepository = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify_error(e, repo))?;

        Ok(RepoMeta {
            full_name: meta.full_name,
            description: meta.description.filter(|d| !d.trim().is_empty()),
            language: meta.language,
        })
    }
}

#[derive(Serialize)]
struct ListCommitsParams<'a> {
    per_page: u8,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<String>,
}

#[derive(Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiGitCommit,
    #[serde(default)]
    author: Option<ApiUser>,
    #[serde(default)]
    parents: Vec<ApiParent>,
    #[serde(default)]
    stats: Option<ApiStats>,
    #[serde(default)]
    files: Vec<ApiFile>,
}

#[derive(Deserialize)]
struct ApiGitCommit {
    message: String,
    #[serde(default)]
    author: Option<ApiGitActor>,
    #[serde(default)]
    committer: Option<ApiGitActor>,
}

#[derive(Deserialize)]
struct ApiGitActor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiParent {
    sha: String,
}

#[derive(Deserialize)]
struct ApiStats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct ApiFile {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Deserialize)]
struct ApiComparison {
    #[serde(default)]
    ahead_by: usize,
    #[serde(default)]
    behind_by: usize,
    #[serde(default)]
    total_commits: usize,
    #[serde(default)]
    files: Vec<ApiFile>,
}

#[derive(Deserialize)]
struct ApiRepository {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

impl From<ApiFile> for FileChange {
    fn from(file: ApiFile) -> Self {
        FileChange {
            path: file.filename,
            status: FileStatus::from_api(&file.status),
            additions: file.additions,
            deletions: file.deletions,
            patch: file.patch,
        }
    }
}

impl From<ApiStats> for ChangeStats {
    fn from(stats: ApiStats) -> Self {
        ChangeStats {
            additions: stats.additions,
            deletions: stats.deletions,
            total: stats.total,
        }
    }
}

impl ApiCommit {
    /// Convert to the domain commit. Returns `None` when GitHub reports no
    /// usable timestamp.
    fn into_commit(self) -> Option<Commit> {
        let ApiGitCommit {
            message,
            author,
            committer,
        } = self.commit;

        let date = author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| committer.as_ref().and_then(|c| c.date))?;
        let actor = author.or(committer);

        let files: Vec<FileChange> = self.files.into_iter().map(FileChange::from).collect();

        Some(Commit {
            sha: self.sha,
            author: CommitAuthor {
                name: actor.as_ref().map(|a| a.name.clone()).unwrap_or_default(),
                email: actor.map(|a| a.email).unwrap_or_default(),
                login: self.author.map(|u| u.login),
            },
            message,
            date,
            parents: self.parents.into_iter().map(|p| p.sha).collect(),
            stats: self.stats.map(ChangeStats::from),
            files,
        })
    }
}

#[async_trait]
impl CommitSource for GitHubSource {
    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
    ) -> Result<Vec<Commit>, SourceError> {
        let route = format!("/repos/{}/{}/commits", repo.owner, repo.name);
        let mut commits = Vec::new();
        let mut page = 1u32;

        loop {
            let params = ListCommitsParams {
                per_page: self.page_size,
                page,
                author: filter.author.as_deref(),
                since: filter.since.map(|d| d.to_rfc3339()),
                until: filter.until.map(|d| d.to_rfc3339()),
            };

            let items: Vec<ApiCommit> = self
                .client
                .get(&route, Some(&params))
                .await
                .map_err(|e| classify_error(e, repo))?;

            let fetched = items.len();
            debug!("Fetched {} commits from {} (page {})", fetched, repo, page);

            for item in items {
                let sha = item.sha.clone();
                match item.into_commit() {
                    Some(commit) => commits.push(commit),
                    None => warn!("Skipping commit {} with no timestamp", sha),
                }
            }

            if fetched < usize::from(self.page_size) {
                break;
            }

            page += 1;

            if page > MAX_PAGES {
                warn!(
                    "Reached {}-page safety limit while fetching commits for {}",
                    MAX_PAGES, repo
                );
                break;
            }
        }

        Ok(commits)
    }

    async fn get_commit_detail(
        &self,
        repo: &RepoRef,
        sha: &str,
    ) -> Result<CommitDetail, SourceError> {
        let route = format!("/repos/{}/{}/commits/{}", repo.owner, repo.name, sha);
        let item: ApiCommit = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify_error(e, repo))?;

        let files: Vec<FileChange> = item.files.into_iter().map(FileChange::from).collect();
        let stats = item
            .stats
            .map(ChangeStats::from)
            .unwrap_or_else(|| ChangeStats::from_files(&files));

        Ok(CommitDetail { files, stats })
    }

    async fn compare_commits(
        &self,
        repo: &RepoRef,
        base: &str,
        head: &str,
    ) -> Result<Comparison, SourceError> {
        let route = format!(
            "/repos/{}/{}/compare/{}...{}",
            repo.owner, repo.name, base, head
        );
        let comparison: ApiComparison = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(|e| SourceError::ComparisonUnavailable {
                base: base.to_string(),
                head: head.to_string(),
                reason: classify_error(e, repo).to_string(),
            })?;

        let files: Vec<FileChange> = comparison.files.into_iter().map(FileChange::from).collect();
        let stats = ChangeStats::from_files(&files);

        Ok(Comparison {
            files,
            stats,
            total_commits: comparison.total_commits,
            ahead_by: comparison.ahead_by,
            behind_by: comparison.behind_by,
        })
    }
}

/// Map an octocrab failure onto the error a user can act on.
fn classify_error(e: octocrab::Error, repo: &RepoRef) -> GitHubError {
    // Check both Display and Debug output to handle different octocrab error formats
    let err_display = e.to_string();
    let err_debug = format!("{:?}", e);

    if err_display.to_lowercase().contains("rate limit")
        || err_debug.to_lowercase().contains("rate limit")
    {
        return GitHubError::RateLimited {
            reset_time: "unknown".to_string(),
        };
    }
    if err_display.contains("Not Found") || err_debug.contains("Not Found") {
        return GitHubError::RepositoryNotFound {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
        };
    }
    GitHubError::Request(Box::new(e))
}
