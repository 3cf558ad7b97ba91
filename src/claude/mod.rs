//! Claude CLI integration.

pub mod provider;
pub mod subprocess;

pub use provider::{ClaudeExecutor, ClaudeProvider, DefaultExecutor, ModelConfig};
pub use subprocess::{check_claude_installed, run_claude};
