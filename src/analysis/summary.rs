//! Aggregate statistics and the narrative synthesis over a run's analyses.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::analysis::pipeline::Analysis;
use crate::analysis::prompt::build_synthesis_prompt;
use crate::batch::Category;
use crate::error::CompletionError;
use crate::llm::{CompletionOptions, CompletionProvider, ModelTier, TokenUsage};
use crate::model::RepoMeta;

/// Counts over a set of analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub by_category: BTreeMap<Category, usize>,
    pub total_batches: usize,
    pub total_commits: usize,
    /// Analyses at or above the escalation threshold.
    pub important_count: usize,
    /// Analyses carrying a detailed analysis.
    pub detailed_count: usize,
}

/// Count analyses by category, commits, and escalation outcome.
pub fn get_stats(analyses: &[Analysis]) -> AggregateStats {
    let mut stats = AggregateStats {
        total_batches: analyses.len(),
        ..Default::default()
    };
    for analysis in analyses {
        *stats.by_category.entry(analysis.category).or_default() += 1;
        stats.total_commits += analysis.batch.len();
        if analysis.is_important() {
            stats.important_count += 1;
        }
        if analysis.detailed_analysis.is_some() {
            stats.detailed_count += 1;
        }
    }
    stats
}

/// Narrative summary with the run's cumulative token usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub text: String,
    pub usage: TokenUsage,
}

/// Synthesize a narrative over all analyses on the detailed tier.
///
/// The request's usage is added to `usage`, and the returned summary carries
/// the cumulative total. Failures propagate to the caller.
pub async fn summarize(
    analyses: &[Analysis],
    meta: &RepoMeta,
    llm: &dyn CompletionProvider,
    usage: &mut TokenUsage,
) -> Result<Summary, CompletionError> {
    let prompt = build_synthesis_prompt(analyses, meta);
    let completion = llm
        .complete(&prompt, ModelTier::Detailed, &CompletionOptions::default())
        .await?;

    usage.record(&completion.usage);
    info!(
        "Synthesized summary for {} ({} tokens this run)",
        meta.full_name,
        usage.total_tokens()
    );

    Ok(Summary {
        text: completion.text.trim().to_string(),
        usage: *usage,
    })
}
