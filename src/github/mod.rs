//! GitHub API access using octocrab.

pub mod auth;
pub mod client;

pub use auth::get_github_token;
pub use client::GitHubSource;
