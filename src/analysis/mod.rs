//! Two-pass batch analysis and aggregation.

pub mod pipeline;
pub mod prompt;
pub mod summary;

pub use pipeline::{Analysis, AnalysisRun, IMPORTANCE_THRESHOLD, analyze_batches};
pub use summary::{AggregateStats, Summary, get_stats, summarize};
