//! Grouping of a commit stream into time- and size-bounded batches.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::category::{Category, categorize};
use crate::error::ConfigError;
use crate::model::Commit;

pub const DEFAULT_TIME_WINDOW_HOURS: u32 = 4;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// Batching limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum distance between a batch's newest commit and any later member.
    pub time_window_hours: u32,
    pub max_batch_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            time_window_hours: DEFAULT_TIME_WINDOW_HOURS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl BatchOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.max_batch_size));
        }
        Ok(())
    }

    fn window(&self) -> Duration {
        Duration::hours(i64::from(self.time_window_hours))
    }
}

/// A closed group of commits treated as one unit of work.
///
/// Commits are ordered newest first; `start_date` is the newest timestamp and
/// `end_date` the oldest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub commits: Vec<Commit>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category: Category,
    /// Touched paths in first-seen order; empty when the provider reported none.
    pub files: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn newest(&self) -> Option<&Commit> {
        self.commits.first()
    }

    pub fn oldest(&self) -> Option<&Commit> {
        self.commits.last()
    }
}

/// An open batch accepting commits until it is closed.
#[derive(Debug)]
pub struct BatchBuilder {
    commits: Vec<Commit>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    category: Category,
    files: IndexSet<String>,
}

impl BatchBuilder {
    /// Open a batch seeded with its newest commit.
    pub fn new(seed: Commit) -> Self {
        let mut builder = Self {
            start_date: seed.date,
            end_date: seed.date,
            category: categorize(&seed.message),
            commits: Vec::new(),
            files: IndexSet::new(),
        };
        builder.push(seed);
        builder
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether `commit` may join this batch under `options`.
    pub fn accepts(&self, commit: &Commit, options: &BatchOptions) -> bool {
        self.commits.len() < options.max_batch_size
            && self.start_date - commit.date <= options.window()
    }

    /// Append an older commit. The category only moves from `other` to a
    /// specific label; a specific label is never replaced.
    pub fn append(&mut self, commit: Commit) {
        self.end_date = commit.date;
        if self.category.is_other() {
            let candidate = categorize(&commit.message);
            if !candidate.is_other() {
                self.category = candidate;
            }
        }
        self.push(commit);
    }

    fn push(&mut self, commit: Commit) {
        for file in &commit.files {
            self.files.insert(file.path.clone());
        }
        self.commits.push(commit);
    }

    /// Freeze the batch.
    pub fn close(self) -> Batch {
        Batch {
            commits: self.commits,
            start_date: self.start_date,
            end_date: self.end_date,
            category: self.category,
            files: self.files.into_iter().collect(),
        }
    }
}

/// Partition commits into batches, newest first.
///
/// Options are validated before any work; empty input yields no batches.
pub fn batch_commits(
    mut commits: Vec<Commit>,
    options: &BatchOptions,
) -> Result<Vec<Batch>, ConfigError> {
    options.validate()?;

    // Stable sort keeps input order among identical timestamps.
    commits.sort_by(|a, b| b.date.cmp(&a.date));

    let mut batches = Vec::new();
    let mut open: Option<BatchBuilder> = None;

    for commit in commits {
        if let Some(builder) = open.as_mut()
            && builder.accepts(&commit, options)
        {
            builder.append(commit);
            continue;
        }

        if let Some(done) = open.replace(BatchBuilder::new(commit)) {
            batches.push(done.close());
        }
    }

    if let Some(done) = open {
        batches.push(done.close());
    }

    debug!("Grouped commits into {} batches", batches.len());
    Ok(batches)
}
