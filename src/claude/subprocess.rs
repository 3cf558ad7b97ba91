//! Claude CLI spawning.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ClaudeError;

/// Default timeout for Claude subprocess execution (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
pub const TIMEOUT_ENV_VAR: &str = "GITLORE_CLAUDE_TIMEOUT";

/// Read the timeout from `GITLORE_CLAUDE_TIMEOUT`, falling back to 300s and
/// warning on unparseable values.
pub fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Check that the Claude Code CLI is installed and runs.
pub async fn check_claude_installed() -> Result<(), ClaudeError> {
    if which::which("claude").is_err() {
        return Err(ClaudeError::NotInstalled);
    }

    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(ClaudeError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(ClaudeError::NotInstalled);
    }

    Ok(())
}

/// One Claude CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeInvocation<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub system_prompt: Option<&'a str>,
}

impl ClaudeInvocation<'_> {
    /// Command-line arguments, without the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.prompt.to_string(),
            "--output-format".to_string(),
            "json".to_string(),
            "--model".to_string(),
            self.model.to_string(),
        ];
        if let Some(system) = self.system_prompt {
            args.push("--append-system-prompt".to_string());
            args.push(system.to_string());
        }
        args
    }
}

/// Run the Claude CLI and return its stdout (the JSON envelope).
///
/// Times out after `GITLORE_CLAUDE_TIMEOUT` seconds (default 300).
pub async fn run_claude(invocation: &ClaudeInvocation<'_>) -> Result<String, ClaudeError> {
    let timeout_duration = get_timeout();
    let timeout_secs = timeout_duration.as_secs();

    debug!(
        "Running claude (model={}, prompt={} chars)",
        invocation.model,
        invocation.prompt.len()
    );

    let output = timeout(
        timeout_duration,
        Command::new("claude")
            .args(invocation.args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| ClaudeError::Timeout(timeout_secs))?
    .map_err(ClaudeError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
