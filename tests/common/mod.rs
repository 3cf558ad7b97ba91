//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Signature, Time};
use gitlore::model::{Commit, CommitAuthor};

/// Fixed reference point for test timestamps.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// A commit record `minutes` after [`base_time`].
pub fn commit_at(sha: &str, minutes: i64, message: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        author: CommitAuthor {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            login: None,
        },
        message: message.to_string(),
        date: base_time() + chrono::Duration::minutes(minutes),
        parents: vec![],
        stats: None,
        files: vec![],
    }
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(name: &str, email: &str, at: DateTime<Utc>) -> Signature<'static> {
        Signature::new(name, email, &Time::new(at.timestamp(), 0))
            .expect("Failed to create signature")
    }

    /// Write `files` and commit them on HEAD as the default author, `minutes`
    /// after [`base_time`]. Returns the commit OID.
    pub fn commit_files(&self, minutes: i64, message: &str, files: &[(&str, &str)]) -> Oid {
        self.commit_as("Test User", "test@example.com", minutes, message, files)
    }

    /// Like [`TestRepo::commit_files`] with an explicit author.
    pub fn commit_as(
        &self,
        name: &str,
        email: &str,
        minutes: i64,
        message: &str,
        files: &[(&str, &str)],
    ) -> Oid {
        let sig = Self::signature(name, email, base_time() + chrono::Duration::minutes(minutes));

        let mut index = self.repo.index().expect("Failed to get index");
        for (path, content) in files {
            let full = self.dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create directories");
            }
            std::fs::write(&full, content).expect("Failed to write test file");
            index.add_path(Path::new(path)).expect("Failed to add file");
        }
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a commit with no parents that is not reachable from HEAD.
    pub fn orphan_commit(&self, minutes: i64, message: &str) -> Oid {
        let sig = Self::signature(
            "Test User",
            "test@example.com",
            base_time() + chrono::Duration::minutes(minutes),
        );
        let mut builder = self.repo.treebuilder(None).expect("Failed to create treebuilder");
        let blob = self.repo.blob(b"orphan").expect("Failed to write blob");
        builder
            .insert("orphan.txt", blob, 0o100644)
            .expect("Failed to insert blob");
        let tree_id = builder.write().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        self.repo
            .commit(None, &sig, &sig, message, &tree, &[])
            .expect("Failed to create orphan commit")
    }

    /// Point `origin` at a remote URL.
    pub fn set_origin(&self, url: &str) {
        self.repo.remote("origin", url).expect("Failed to add remote");
    }
}
