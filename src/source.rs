//! The commit provider seam: listing, single-commit detail, and range comparison.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{ConfigError, SourceError};
use crate::model::{Commit, CommitDetail, Comparison, RepoRef};

/// Filters applied when listing commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitFilter {
    /// Login, name, or email of the author.
    pub author: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl CommitFilter {
    /// Build a filter from calendar dates. `until` is inclusive of the whole day.
    pub fn from_dates(
        author: Option<String>,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Self, ConfigError> {
        if let (Some(s), Some(u)) = (since, until)
            && s > u
        {
            return Err(ConfigError::EmptyDateRange {
                since: s.to_string(),
                until: u.to_string(),
            });
        }

        Ok(Self {
            author,
            since: since.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc()),
            until: until
                .and_then(|d| d.and_hms_opt(23, 59, 59))
                .map(|d| d.and_utc()),
        })
    }

    /// Whether a commit timestamp falls inside the date window.
    pub fn contains_date(&self, date: DateTime<Utc>) -> bool {
        self.since.is_none_or(|s| date >= s) && self.until.is_none_or(|u| date <= u)
    }
}

/// Parse a `YYYY-MM-DD` command-line date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate(s.to_string()))
}

/// Provider of commit history and diffs.
///
/// This abstraction allows mocking the provider in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// List commits matching the filter, paginating internally.
    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
    ) -> Result<Vec<Commit>, SourceError>;

    /// Fetch file-level detail for one commit.
    async fn get_commit_detail(
        &self,
        repo: &RepoRef,
        sha: &str,
    ) -> Result<CommitDetail, SourceError>;

    /// Compare `base...head`. Fails with `SourceError::ComparisonUnavailable`
    /// when the range cannot be computed.
    async fn compare_commits(
        &self,
        repo: &RepoRef,
        base: &str,
        head: &str,
    ) -> Result<Comparison, SourceError>;
}
