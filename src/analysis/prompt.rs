//! Prompt construction for the classification, detailed-analysis, and
//! synthesis requests.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::analysis::pipeline::Analysis;
use crate::batch::{Batch, Category};
use crate::changes::ChangeSet;
use crate::model::{Commit, FileChange, RepoMeta, RepoRef};

/// Files listed in a detailed-analysis prompt before the rest are summarized.
pub const MAX_PROMPT_FILES: usize = 10;

/// Files whose patch text is included in a detailed-analysis prompt.
pub const MAX_PATCH_FILES: usize = 5;

/// Total patch characters included in a detailed-analysis prompt.
pub const MAX_PATCH_CHARS: usize = 3000;

/// Analyses per category included in the synthesis prompt.
pub const MAX_PER_CATEGORY: usize = 5;

/// Lines kept from any single commit message.
const MAX_MESSAGE_LINES: usize = 50;

/// Neutralize markdown structure in user-authored text before it is
/// embedded in a prompt.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("```", "'''")
        .replace("##", "//")
        .lines()
        .take(MAX_MESSAGE_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

fn commit_line(commit: &Commit) -> String {
    format!(
        "- {} {} {}",
        commit.short_sha(),
        commit.date.format("%Y-%m-%d %H:%M"),
        sanitize_for_prompt(commit.summary())
    )
}

/// Build the fast-tier classification prompt for a batch.
///
/// Uses only batch metadata and commit one-liners; no diffs.
pub fn build_classification_prompt(batch: &Batch, repo: &RepoRef) -> String {
    let commits: String = batch
        .commits
        .iter()
        .map(commit_line)
        .collect::<Vec<_>>()
        .join("\n");

    let files = if batch.files.is_empty() {
        "unknown".to_string()
    } else {
        let shown: Vec<&str> = batch
            .files
            .iter()
            .take(MAX_PROMPT_FILES)
            .map(String::as_str)
            .collect();
        let mut files = shown.join(", ");
        if batch.files.len() > MAX_PROMPT_FILES {
            let _ = write!(files, " (+{} more)", batch.files.len() - MAX_PROMPT_FILES);
        }
        files
    };

    let categories = Category::ALL
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are classifying a batch of related commits from the repository "{repo}".

## Batch
Commits: {count}
Period: {end} to {start}
Heuristic category: {category}
Files touched: {files}

## Commits
{commits}

## Instructions
1. Pick the category that best describes the batch: one of {categories}
2. Write a one-sentence, factual description of the work (no marketing language)
3. Rate importance from 1 (trivial) to 5 (major architectural or user-facing change)

Respond with JSON:
{{"category": "...", "description": "...", "importance": 3}}"#,
        count = batch.len(),
        end = batch.end_date.format("%Y-%m-%d %H:%M"),
        start = batch.start_date.format("%Y-%m-%d %H:%M"),
        category = batch.category,
    )
}

/// Render a capped file list.
fn files_section(files: &[FileChange]) -> String {
    let mut out: Vec<String> = files
        .iter()
        .take(MAX_PROMPT_FILES)
        .map(|f| format!("- {} ({}, +{} -{})", f.path, f.status, f.additions, f.deletions))
        .collect();
    if files.len() > MAX_PROMPT_FILES {
        out.push(format!("... and {} more files", files.len() - MAX_PROMPT_FILES));
    }
    out.join("\n")
}

/// Render patch excerpts within the file and character budgets.
fn patches_section(files: &[FileChange]) -> String {
    let with_patch: Vec<&FileChange> = files.iter().filter(|f| f.patch.is_some()).collect();
    let mut out = String::new();
    let mut remaining = MAX_PATCH_CHARS;

    for file in with_patch.iter().take(MAX_PATCH_FILES) {
        let Some(patch) = file.patch.as_deref() else {
            continue;
        };
        if remaining == 0 {
            out.push_str("... [patch budget spent]\n");
            break;
        }

        let patch = patch.replace("```", "'''");
        let excerpt: String = patch.chars().take(remaining).collect();
        remaining -= excerpt.chars().count();

        let _ = writeln!(out, "### {}\n```diff\n{}", file.path, excerpt);
        if excerpt.len() < patch.len() {
            out.push_str("... [truncated]\n");
        }
        out.push_str("```\n");
    }

    if with_patch.len() > MAX_PATCH_FILES {
        let _ = writeln!(
            out,
            "... patches for {} more files omitted",
            with_patch.len() - MAX_PATCH_FILES
        );
    }
    out
}

fn changes_section(changes: &ChangeSet) -> String {
    match changes {
        ChangeSet::Single { files, stats, .. } | ChangeSet::Range { files, stats, .. } => {
            let scope = match changes {
                ChangeSet::Range {
                    base,
                    head,
                    commit_count,
                    ..
                } => format!(
                    "Range {}...{} ({} commits)",
                    &base[..base.len().min(7)],
                    &head[..head.len().min(7)],
                    commit_count
                ),
                _ => "Single commit".to_string(),
            };
            let patches = patches_section(files);
            let mut out = format!(
                "{scope}: {} files, +{} -{}\n\n## Files\n{}",
                files.len(),
                stats.additions,
                stats.deletions,
                files_section(files)
            );
            if !patches.is_empty() {
                let _ = write!(out, "\n\n## Patches\n{}", patches);
            }
            out
        }
        ChangeSet::MessagesOnly { commits } => {
            let messages = commits
                .iter()
                .map(|c| {
                    format!(
                        "- {}: {}",
                        &c.sha[..c.sha.len().min(7)],
                        sanitize_for_prompt(&c.message)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "No diff is available; only the full commit messages.\n\n## Messages\n{messages}"
            )
        }
    }
}

/// Build the detailed-tier prompt for an escalated batch.
pub fn build_detailed_prompt(analysis: &Analysis, changes: &ChangeSet, repo: &RepoRef) -> String {
    let commits: String = analysis
        .batch
        .commits
        .iter()
        .map(commit_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are writing a factual, technical account of a unit of work in the repository "{repo}".

## Classification
Category: {category}
Importance: {importance}/5
Summary: {description}

## Commits
{commits}

## Changes
{changes}

## Instructions
1. Describe what was built or changed and how, in 1-3 short paragraphs
2. Name concrete components, files, and techniques visible in the changes
3. State only what the commits and diffs support; do not speculate about impact

Respond with plain text only."#,
        category = analysis.category,
        importance = analysis.importance,
        description = sanitize_for_prompt(&analysis.description),
        changes = changes_section(changes),
    )
}

/// Group analyses by category, most important first, capped per category.
pub fn group_for_synthesis(analyses: &[Analysis]) -> BTreeMap<Category, Vec<&Analysis>> {
    let mut groups: BTreeMap<Category, Vec<&Analysis>> = BTreeMap::new();
    for analysis in analyses {
        groups.entry(analysis.category).or_default().push(analysis);
    }
    for group in groups.values_mut() {
        // Stable sort keeps batch order among equal importance.
        group.sort_by(|a, b| b.importance.cmp(&a.importance));
        group.truncate(MAX_PER_CATEGORY);
    }
    groups
}

/// Build the synthesis prompt over all analyses of a repository.
pub fn build_synthesis_prompt(analyses: &[Analysis], meta: &RepoMeta) -> String {
    let mut sections = String::new();
    for (category, group) in group_for_synthesis(analyses) {
        let _ = writeln!(sections, "### {}", category);
        for analysis in group {
            let _ = writeln!(
                sections,
                "- [importance {}] {} ({} commits, {})",
                analysis.importance,
                sanitize_for_prompt(&analysis.description),
                analysis.batch.len(),
                analysis.batch.start_date.format("%Y-%m-%d"),
            );
            if let Some(detail) = &analysis.detailed_analysis {
                let detail: String = sanitize_for_prompt(detail).chars().take(600).collect();
                let _ = writeln!(sections, "  Detail: {}", detail.replace('\n', " "));
            }
        }
        sections.push('\n');
    }

    let mut context = format!("Repository: {}", meta.full_name);
    if let Some(language) = &meta.language {
        let _ = write!(context, "\nPrimary language: {}", language);
    }
    if let Some(description) = &meta.description {
        let _ = write!(context, "\nDescription: {}", sanitize_for_prompt(description));
    }

    format!(
        r#"You are summarizing one developer's contribution history to a repository.

## Repository
{context}

## Work by category ({total} batches analyzed)
{sections}
## Instructions
1. Write a concise narrative (2-4 paragraphs) of the work, most significant first
2. Stay factual and technical; cite concrete features, fixes, and components
3. Do not invent work that is not listed above

Respond with plain text only."#,
        total = analyses.len(),
    )
}
