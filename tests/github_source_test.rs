//! Integration tests for the GitHub commit source with a mocked API.

mod common;

use chrono::{TimeZone, Utc};
use gitlore::error::{GitHubError, SourceError};
use gitlore::github::GitHubSource;
use gitlore::model::{FileStatus, RepoRef};
use gitlore::source::{CommitFilter, CommitSource};
use octocrab::Octocrab;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a source whose octocrab client points to a mock server.
async fn mock_source(server: &MockServer) -> GitHubSource {
    let client = Octocrab::builder()
        .base_uri(server.uri())
        .expect("Failed to set base URI")
        .build()
        .expect("Failed to build octocrab");
    GitHubSource::with_client(client)
}

fn repo() -> RepoRef {
    RepoRef::new("owner", "repo")
}

/// A commit list item as the REST API returns it.
fn mock_commit(sha: &str, message: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "node_id": format!("C_{}", sha),
        "commit": {
            "author": {"name": "Test User", "email": "test@example.com", "date": date},
            "committer": {"name": "Test User", "email": "test@example.com", "date": date},
            "message": message,
            "tree": {"sha": "tree", "url": "https://api.github.com/tree"},
            "comment_count": 0
        },
        "author": {"login": "testuser", "id": 100},
        "committer": {"login": "testuser", "id": 100},
        "parents": [{"sha": "parent", "url": "https://api.github.com/parent"}]
    })
}

fn mock_file(name: &str, status: &str, additions: u64, deletions: u64) -> Value {
    json!({
        "sha": "blob",
        "filename": name,
        "status": status,
        "additions": additions,
        "deletions": deletions,
        "changes": additions + deletions,
        "patch": format!("@@ -1,{} +1,{} @@", deletions, additions)
    })
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "message": "Not Found",
        "documentation_url": "https://docs.github.com/rest"
    }))
}

// =============================================================================
// LISTING
// =============================================================================

#[tokio::test]
async fn test_list_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            mock_commit("bbb", "fix: second", "2024-06-15T12:00:00Z"),
            mock_commit("aaa", "feat: first\n\nWith body", "2024-06-15T10:00:00Z"),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let commits = source
        .list_commits(&repo(), &CommitFilter::default())
        .await
        .expect("listing should succeed");

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].sha, "bbb");
    assert_eq!(commits[1].summary(), "feat: first");
    assert_eq!(commits[1].author.login.as_deref(), Some("testuser"));
    assert_eq!(
        commits[1].date,
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_list_follows_full_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            mock_commit("c3", "three", "2024-06-15T12:00:00Z"),
            mock_commit("c2", "two", "2024-06-15T11:00:00Z"),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![mock_commit(
            "c1",
            "one",
            "2024-06-15T10:00:00Z",
        )]))
        .expect(1)
        .mount(&server)
        .await;

    let source = mock_source(&server).await.with_page_size(2);
    let commits = source
        .list_commits(&repo(), &CommitFilter::default())
        .await
        .unwrap();

    let shas: Vec<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(shas, vec!["c3", "c2", "c1"]);
}

#[tokio::test]
async fn test_list_empty_repository() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Value>::new()))
        .expect(1)
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let commits = source
        .list_commits(&repo(), &CommitFilter::default())
        .await
        .unwrap();
    assert!(commits.is_empty());
}

#[tokio::test]
async fn test_list_passes_filters_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .and(query_param("author", "testuser"))
        .and(query_param("since", "2024-06-01T00:00:00+00:00"))
        .and(query_param("until", "2024-06-30T23:59:59+00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![mock_commit(
            "aaa",
            "feat: x",
            "2024-06-15T10:00:00Z",
        )]))
        .expect(1)
        .mount(&server)
        .await;

    let filter = CommitFilter::from_dates(
        Some("testuser".to_string()),
        Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
        Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
    )
    .unwrap();

    let source = mock_source(&server).await;
    let commits = source.list_commits(&repo(), &filter).await.unwrap();
    assert_eq!(commits.len(), 1);
}

#[tokio::test]
async fn test_list_without_filters_omits_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .and(query_param_is_missing("author"))
        .and(query_param_is_missing("since"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Value>::new()))
        .expect(1)
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    source
        .list_commits(&repo(), &CommitFilter::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_safety_limit_50_pages() {
    let server = MockServer::start().await;

    // Every page is full, so only the safety limit stops pagination
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![mock_commit(
            "same",
            "chore: page",
            "2024-06-15T10:00:00Z",
        )]))
        .expect(50)
        .mount(&server)
        .await;

    let source = mock_source(&server).await.with_page_size(1);
    let commits = source
        .list_commits(&repo(), &CommitFilter::default())
        .await
        .unwrap();
    assert_eq!(commits.len(), 50);
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "API rate limit exceeded for user",
            "documentation_url": "https://docs.github.com/rest/overview/resources-in-the-rest-api#rate-limiting"
        })))
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let result = source.list_commits(&repo(), &CommitFilter::default()).await;

    match result {
        Err(SourceError::GitHub(GitHubError::RateLimited { .. })) => {}
        other => panic!("Expected RateLimited error, got {:?}", other.map(|c| c.len())),
    }
}

#[tokio::test]
async fn test_repository_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/nonexistent/commits"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let result = source
        .list_commits(&RepoRef::new("owner", "nonexistent"), &CommitFilter::default())
        .await;

    match result {
        Err(SourceError::GitHub(GitHubError::RepositoryNotFound { owner, repo })) => {
            assert_eq!(owner, "owner");
            assert_eq!(repo, "nonexistent");
        }
        other => panic!(
            "Expected RepositoryNotFound error, got {:?}",
            other.map(|c| c.len())
        ),
    }
}

// =============================================================================
// DETAIL AND COMPARISON
// =============================================================================

#[tokio::test]
async fn test_commit_detail() {
    let server = MockServer::start().await;

    let mut body = mock_commit("aaa", "feat: add parser", "2024-06-15T10:00:00Z");
    body["stats"] = json!({"additions": 12, "deletions": 3, "total": 15});
    body["files"] = json!([
        mock_file("src/parser.rs", "added", 10, 0),
        mock_file("src/lib.rs", "modified", 2, 3),
    ]);

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits/aaa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let detail = source.get_commit_detail(&repo(), "aaa").await.unwrap();

    assert_eq!(detail.stats.total, 15);
    assert_eq!(detail.files.len(), 2);
    assert_eq!(detail.files[0].path, "src/parser.rs");
    assert_eq!(detail.files[0].status, FileStatus::Added);
    assert!(detail.files[1].patch.is_some());
}

#[tokio::test]
async fn test_compare_sums_file_stats() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/compare/old...new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ahead",
            "ahead_by": 3,
            "behind_by": 0,
            "total_commits": 3,
            "commits": [],
            "files": [
                mock_file("a.rs", "modified", 4, 1),
                mock_file("b.rs", "removed", 0, 20),
                mock_file("c.rs", "renamed", 1, 1)
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let comparison = source.compare_commits(&repo(), "old", "new").await.unwrap();

    assert_eq!(comparison.total_commits, 3);
    assert_eq!(comparison.ahead_by, 3);
    assert_eq!(comparison.stats.additions, 5);
    assert_eq!(comparison.stats.deletions, 22);
    assert_eq!(comparison.stats.total, 27);
    assert_eq!(comparison.files[1].status, FileStatus::Removed);
    assert_eq!(comparison.files[2].status, FileStatus::Renamed);
}

#[tokio::test]
async fn test_compare_failure_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/compare/gone...new"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let result = source.compare_commits(&repo(), "gone", "new").await;

    match result {
        Err(SourceError::ComparisonUnavailable { base, head, .. }) => {
            assert_eq!(base, "gone");
            assert_eq!(head, "new");
        }
        other => panic!(
            "Expected ComparisonUnavailable, got {:?}",
            other.map(|c| c.total_commits)
        ),
    }
}

#[tokio::test]
async fn test_fetch_repo_meta() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "repo",
            "full_name": "owner/repo",
            "description": "A widget toolkit",
            "language": "Rust"
        })))
        .mount(&server)
        .await;

    let source = mock_source(&server).await;
    let meta = source.fetch_repo_meta(&repo()).await.unwrap();

    assert_eq!(meta.full_name, "owner/repo");
    assert_eq!(meta.description.as_deref(), Some("A widget toolkit"));
    assert_eq!(meta.language.as_deref(), Some("Rust"));
}
