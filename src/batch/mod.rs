//! Commit categorization and batching.

pub mod builder;
pub mod category;

pub use builder::{Batch, BatchBuilder, BatchOptions, batch_commits};
pub use category::{Category, categorize};
