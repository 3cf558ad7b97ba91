//! Integration tests for the local repository commit source.

mod common;

use chrono::NaiveDate;
use common::{TestRepo, base_time};
use gitlore::error::SourceError;
use gitlore::git::LocalSource;
use gitlore::model::{FileStatus, RepoRef};
use gitlore::source::{CommitFilter, CommitSource};

fn repo_ref() -> RepoRef {
    RepoRef::new("local", "test")
}

#[tokio::test]
async fn test_list_commits_newest_first_with_files() {
    let repo = TestRepo::new();
    repo.commit_files(
        0,
        "feat: add parser",
        &[("src/parser.rs", "fn parse() {}\n")],
    );
    repo.commit_files(
        30,
        "fix: parser edge case",
        &[("src/parser.rs", "fn parse() { todo() }\n")],
    );
    let head = repo.commit_files(60, "docs: readme", &[("README.md", "# Test\n")]);

    let source = LocalSource::open(repo.path()).unwrap();
    let commits = source
        .list_commits(&repo_ref(), &CommitFilter::default())
        .await
        .unwrap();

    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0].sha, head.to_string());
    assert_eq!(commits[0].summary(), "docs: readme");
    assert_eq!(commits[0].date, base_time() + chrono::Duration::minutes(60));
    assert_eq!(commits[0].files.len(), 1);
    assert_eq!(commits[0].files[0].path, "README.md");
    assert!(commits[0].files[0].patch.is_none());
    assert_eq!(commits[0].parents.len(), 1);
    assert!(commits[2].parents.is_empty());
    assert_eq!(commits[2].files[0].status, FileStatus::Added);
}

#[tokio::test]
async fn test_list_commits_filters_author_and_dates() {
    let repo = TestRepo::new();
    repo.commit_as("Ada", "ada@example.com", 0, "feat: one", &[("a.txt", "1")]);
    repo.commit_as("Bob", "bob@example.com", 10, "feat: two", &[("b.txt", "2")]);
    repo.commit_as(
        "Ada",
        "ada@example.com",
        3 * 24 * 60,
        "feat: three",
        &[("c.txt", "3")],
    );

    let source = LocalSource::open(repo.path()).unwrap();

    let by_author = CommitFilter {
        author: Some("ADA@example.com".to_string()),
        ..Default::default()
    };
    let commits = source.list_commits(&repo_ref(), &by_author).await.unwrap();
    assert_eq!(commits.len(), 2);
    assert!(commits.iter().all(|c| c.author.name == "Ada"));

    // base_time is 2024-03-01; the last commit lands on 2024-03-04
    let first_day = CommitFilter::from_dates(
        Some("Ada".to_string()),
        NaiveDate::from_ymd_opt(2024, 3, 1),
        NaiveDate::from_ymd_opt(2024, 3, 1),
    )
    .unwrap();
    let commits = source.list_commits(&repo_ref(), &first_day).await.unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].summary(), "feat: one");
}

#[tokio::test]
async fn test_list_commits_empty_repository() {
    let repo = TestRepo::new();
    let source = LocalSource::open(repo.path()).unwrap();
    let commits = source
        .list_commits(&repo_ref(), &CommitFilter::default())
        .await
        .unwrap();
    assert!(commits.is_empty());
}

#[tokio::test]
async fn test_commit_detail_includes_patch() {
    let repo = TestRepo::new();
    repo.commit_files(0, "init", &[("lib.rs", "one\n")]);
    let oid = repo.commit_files(5, "change", &[("lib.rs", "one\ntwo\nthree\n")]);

    let source = LocalSource::open(repo.path()).unwrap();
    let detail = source
        .get_commit_detail(&repo_ref(), &oid.to_string())
        .await
        .unwrap();

    assert_eq!(detail.files.len(), 1);
    let file = &detail.files[0];
    assert_eq!(file.status, FileStatus::Modified);
    assert_eq!(file.additions, 2);
    assert_eq!(file.deletions, 0);
    assert!(file.patch.as_deref().unwrap().contains("+three"));
    assert_eq!(detail.stats.total, 2);
}

#[tokio::test]
async fn test_commit_detail_unknown_sha_fails() {
    let repo = TestRepo::new();
    repo.commit_files(0, "init", &[("a", "a")]);

    let source = LocalSource::open(repo.path()).unwrap();
    let result = source
        .get_commit_detail(&repo_ref(), "0123456789abcdef0123456789abcdef01234567")
        .await;
    assert!(matches!(result, Err(SourceError::Git(_))));
}

#[tokio::test]
async fn test_compare_range() {
    let repo = TestRepo::new();
    let base = repo.commit_files(0, "base", &[("a.rs", "a\n")]);
    repo.commit_files(10, "second", &[("b.rs", "b\n")]);
    let head = repo.commit_files(20, "third", &[("a.rs", "a\nmore\n")]);

    let source = LocalSource::open(repo.path()).unwrap();
    let comparison = source
        .compare_commits(&repo_ref(), &base.to_string(), &head.to_string())
        .await
        .unwrap();

    assert_eq!(comparison.total_commits, 2);
    assert_eq!(comparison.ahead_by, 2);
    assert_eq!(comparison.behind_by, 0);
    let mut paths: Vec<&str> = comparison.files.iter().map(|f| f.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["a.rs", "b.rs"]);
    assert_eq!(comparison.stats.additions, 2);
}

#[tokio::test]
async fn test_compare_unrelated_histories_is_unavailable() {
    let repo = TestRepo::new();
    let head = repo.commit_files(0, "main line", &[("a.rs", "a\n")]);
    let orphan = repo.orphan_commit(5, "unrelated");

    let source = LocalSource::open(repo.path()).unwrap();
    let result = source
        .compare_commits(&repo_ref(), &orphan.to_string(), &head.to_string())
        .await;

    assert!(matches!(
        result,
        Err(SourceError::ComparisonUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_compare_unknown_sha_is_unavailable() {
    let repo = TestRepo::new();
    let head = repo.commit_files(0, "only", &[("a.rs", "a\n")]);

    let source = LocalSource::open(repo.path()).unwrap();
    let result = source
        .compare_commits(&repo_ref(), "deadbeef", &head.to_string())
        .await;

    assert!(matches!(
        result,
        Err(SourceError::ComparisonUnavailable { .. })
    ));
}

#[test]
fn test_repo_ref_from_origin() {
    let repo = TestRepo::new();
    repo.set_origin("git@github.com:acme/widgets.git");

    let source = LocalSource::open(repo.path()).unwrap();
    assert_eq!(source.repo_ref(), RepoRef::new("acme", "widgets"));
}

#[test]
fn test_repo_ref_falls_back_to_directory() {
    let repo = TestRepo::new();
    let source = LocalSource::open(repo.path()).unwrap();
    let repo_ref = source.repo_ref();

    assert_eq!(repo_ref.owner, "local");
    assert!(!repo_ref.name.is_empty());
}

#[test]
fn test_open_non_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    // A bare temp dir may sit under a repository on some machines
    if git2::Repository::discover(dir.path()).is_ok() {
        return;
    }
    assert!(LocalSource::open(dir.path()).is_err());
}
