//! Local repository access using git2-rs.

pub mod commits;
pub mod local;

pub use local::LocalSource;
