//! Two-pass analysis: a cheap classification of every batch, then a detailed
//! analysis of the batches rated important.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::prompt::{build_classification_prompt, build_detailed_prompt};
use crate::batch::{Batch, Category, categorize};
use crate::changes::{ChangeSet, extract_changes};
use crate::llm::{CompletionOptions, CompletionProvider, ModelTier, TokenUsage};
use crate::model::RepoRef;
use crate::source::CommitSource;

/// Batches rated at or above this importance get a detailed analysis.
pub const IMPORTANCE_THRESHOLD: u8 = 3;

/// Importance assigned when the model gives none, or the request failed.
const DEFAULT_IMPORTANCE: u8 = 2;

/// Recorded on important analyses the run stopped before reaching.
const CANCELLED_BEFORE_DETAIL: &str = "cancelled before detailed analysis";

const MIN_IMPORTANCE: u8 = 1;
const MAX_IMPORTANCE: u8 = 5;

/// The outcome of analyzing one batch.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub batch: Arc<Batch>,
    pub category: Category,
    pub description: String,
    /// 1 (trivial) to 5 (major).
    pub importance: u8,
    pub detailed_analysis: Option<String>,
    pub changes: Option<ChangeSet>,
    /// Why the classification fell back to heuristics.
    pub error: Option<String>,
    /// Why the detailed analysis is missing.
    pub detailed_error: Option<String>,
}

impl Analysis {
    /// Analysis built without the model: heuristic category, a description
    /// from the commit messages, and default importance.
    fn degraded(batch: Arc<Batch>, error: String) -> Self {
        Self {
            category: batch.category,
            description: fallback_description(&batch),
            importance: DEFAULT_IMPORTANCE,
            batch,
            detailed_analysis: None,
            changes: None,
            error: Some(error),
            detailed_error: None,
        }
    }

    pub fn is_important(&self) -> bool {
        self.importance >= IMPORTANCE_THRESHOLD
    }

    /// Whether any model request for this batch failed.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some() || self.detailed_error.is_some()
    }
}

/// First commit's subject, noting how many other commits the batch holds.
fn fallback_description(batch: &Batch) -> String {
    let first = batch.newest().map(|c| c.summary()).unwrap_or_default();
    match batch.len().saturating_sub(1) {
        0 => first.to_string(),
        more => format!("{} (+{} more commits)", first, more),
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    /// One entry per batch, in batch order (fewer if cancelled).
    pub analyses: Vec<Analysis>,
    /// Analyses that received a detailed analysis.
    pub detailed_count: usize,
    pub cancelled: bool,
}

/// Shape of the classification response.
#[derive(Debug, Deserialize)]
struct Classification {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    importance: Option<Value>,
}

/// Read an importance rating leniently (number or numeric string) and clamp
/// it into range.
fn parse_importance(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(n) if n.is_finite() => {
            n.round()
                .clamp(f64::from(MIN_IMPORTANCE), f64::from(MAX_IMPORTANCE)) as u8
        }
        _ => DEFAULT_IMPORTANCE,
    }
}

impl Classification {
    fn into_analysis(self, batch: Arc<Batch>) -> Analysis {
        let category = match self.category.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => {
                Category::from_label(label).unwrap_or(Category::Other)
            }
            _ => categorize(batch.newest().map(|c| c.message.as_str()).unwrap_or_default()),
        };
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| fallback_description(&batch));

        Analysis {
            category,
            description,
            importance: parse_importance(self.importance.as_ref()),
            batch,
            detailed_analysis: None,
            changes: None,
            error: None,
            detailed_error: None,
        }
    }
}

/// Pass 1: classify one batch on the fast tier.
async fn classify(
    batch: Arc<Batch>,
    repo: &RepoRef,
    llm: &dyn CompletionProvider,
    usage: &mut TokenUsage,
) -> Analysis {
    let prompt = build_classification_prompt(&batch, repo);

    let completion = match llm.complete_structured(&prompt, ModelTier::Fast).await {
        Ok(completion) => completion,
        Err(e) => {
            warn!("Classification failed, using heuristics: {}", e);
            if let Some(spent) = e.usage() {
                usage.record(spent);
            }
            return Analysis::degraded(batch, e.summary());
        }
    };
    usage.record(&completion.usage);

    match completion.parse::<Classification>() {
        Ok(classification) => classification.into_analysis(batch),
        Err(e) => {
            warn!("Classification response unusable, using heuristics: {}", e);
            Analysis::degraded(batch, e.summary())
        }
    }
}

/// Pass 2: attach changes and a detailed write-up to an important analysis.
async fn analyze_in_detail(
    analysis: &mut Analysis,
    repo: &RepoRef,
    source: &dyn CommitSource,
    llm: &dyn CompletionProvider,
    usage: &mut TokenUsage,
) -> bool {
    let Some(changes) = extract_changes(source, repo, &analysis.batch).await else {
        analysis.detailed_error = Some("batch has no commits".to_string());
        return false;
    };
    debug!("Detailed analysis using {} changes", changes.kind());

    let prompt = build_detailed_prompt(analysis, &changes, repo);
    match llm
        .complete(&prompt, ModelTier::Detailed, &CompletionOptions::default())
        .await
    {
        Ok(completion) => {
            usage.record(&completion.usage);
            let text = completion.text.trim();
            if text.is_empty() {
                analysis.detailed_error = Some("empty detailed analysis".to_string());
                return false;
            }
            analysis.detailed_analysis = Some(text.to_string());
            analysis.changes = Some(changes);
            true
        }
        Err(e) => {
            warn!("Detailed analysis failed: {}", e);
            analysis.detailed_error = Some(e.summary());
            false
        }
    }
}

/// Run both passes over `batches` in order.
///
/// Model and provider failures are recorded on the affected analysis rather
/// than returned. The cancellation token is checked before each batch in both
/// passes; a cancelled run returns what it produced so far.
pub async fn analyze_batches(
    batches: Vec<Batch>,
    repo: &RepoRef,
    source: &dyn CommitSource,
    llm: &dyn CompletionProvider,
    usage: &mut TokenUsage,
    cancel: &CancellationToken,
) -> AnalysisRun {
    let total = batches.len();
    let mut analyses = Vec::with_capacity(total);
    let mut cancelled = false;

    info!("Classifying {} batches for {}", total, repo);
    for (i, batch) in batches.into_iter().enumerate() {
        if cancel.is_cancelled() {
            warn!("Cancelled after classifying {}/{} batches", i, total);
            cancelled = true;
            break;
        }
        debug!("Classifying batch {}/{} ({} commits)", i + 1, total, batch.len());
        analyses.push(classify(Arc::new(batch), repo, llm, usage).await);
    }

    let important = analyses.iter().filter(|a| a.is_important()).count();
    let mut detailed_count = 0;

    if !cancelled {
        info!("{} of {} batches escalated for detailed analysis", important, total);
    }
    for analysis in analyses.iter_mut().filter(|a| a.is_important()) {
        if !cancelled && cancel.is_cancelled() {
            warn!(
                "Cancelled after {} detailed analyses of {}",
                detailed_count, important
            );
            cancelled = true;
        }
        if cancelled {
            analysis.detailed_error = Some(CANCELLED_BEFORE_DETAIL.to_string());
            continue;
        }
        if analyze_in_detail(analysis, repo, source, llm, usage).await {
            detailed_count += 1;
        }
    }

    info!(
        "Analysis complete: {} batches, {} detailed, {} tokens used",
        analyses.len(),
        detailed_count,
        usage.total_tokens()
    );

    AnalysisRun {
        analyses,
        detailed_count,
        cancelled,
    }
}
