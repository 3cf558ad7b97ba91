//! GitHub token discovery.

use std::env;
use std::process::Command;

use tracing::debug;

use crate::error::GitHubError;

/// Environment variables consulted after the gh CLI, in order.
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Get a GitHub token.
///
/// Checks `gh auth token` first, then `GITHUB_TOKEN`, then `GH_TOKEN`.
pub fn get_github_token() -> Result<String, GitHubError> {
    if let Some(token) = token_from_gh_cli() {
        debug!("Using GitHub token from gh CLI");
        return Ok(token);
    }

    token_from_env().ok_or(GitHubError::AuthenticationFailed)
}

fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS.iter().find_map(|var| {
        env::var(var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .inspect(|_| debug!("Using GitHub token from {}", var))
    })
}

fn token_from_gh_cli() -> Option<String> {
    which::which("gh").ok()?;

    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
