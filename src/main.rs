//! gitlore - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gitlore::analysis::{AggregateStats, Analysis, analyze_batches, get_stats, summarize};
use gitlore::batch::builder::{DEFAULT_MAX_BATCH_SIZE, DEFAULT_TIME_WINDOW_HOURS};
use gitlore::batch::{BatchOptions, batch_commits};
use gitlore::claude::provider::{DEFAULT_DETAILED_MODEL, DEFAULT_FAST_MODEL};
use gitlore::claude::{ClaudeProvider, ModelConfig, check_claude_installed};
use gitlore::git::LocalSource;
use gitlore::github::{GitHubSource, get_github_token};
use gitlore::llm::{CompletionProvider, TokenUsage};
use gitlore::model::{RepoMeta, RepoRef};
use gitlore::source::{CommitFilter, CommitSource, parse_date};

/// Summarize contribution history from commits using Claude.
#[derive(Parser, Debug)]
#[command(name = "gitlore")]
#[command(about = "Summarize contribution history from commits using Claude")]
#[command(version)]
struct Cli {
    /// GitHub repository to analyze (owner/name or URL). Repeatable.
    #[arg(long = "repo", value_name = "OWNER/NAME")]
    repos: Vec<String>,

    /// Local repository to analyze. Repeatable. Defaults to the current
    /// directory when no repository is given.
    #[arg(long = "local", value_name = "PATH")]
    locals: Vec<PathBuf>,

    /// Only include commits by this login, name, or email
    #[arg(long)]
    author: Option<String>,

    /// Earliest commit date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    since: Option<NaiveDate>,

    /// Latest commit date, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    until: Option<NaiveDate>,

    /// Maximum gap in hours between a batch's newest commit and any commit in it
    #[arg(long, default_value_t = DEFAULT_TIME_WINDOW_HOURS)]
    time_window_hours: u32,

    /// Maximum commits per batch
    #[arg(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    max_batch_size: usize,

    /// Model used for classifying every batch
    #[arg(long, env = "GITLORE_FAST_MODEL", default_value = DEFAULT_FAST_MODEL)]
    fast_model: String,

    /// Model used for detailed analysis and the summary
    #[arg(long, env = "GITLORE_DETAILED_MODEL", default_value = DEFAULT_DETAILED_MODEL)]
    detailed_model: String,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Where a repository's commits come from.
enum Target {
    GitHub(RepoRef),
    Local(LocalSource),
}

/// Everything produced for one repository.
#[derive(Debug, Serialize)]
struct RepoReport {
    repository: String,
    stats: AggregateStats,
    summary: Option<String>,
    summary_error: Option<String>,
    usage: TokenUsage,
    cancelled: bool,
    analyses: Vec<Analysis>,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gitlore={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Invalid options fail before any remote call
    let options = BatchOptions {
        time_window_hours: cli.time_window_hours,
        max_batch_size: cli.max_batch_size,
    };
    options.validate().context("Invalid batching options")?;
    let filter = CommitFilter::from_dates(cli.author.clone(), cli.since, cli.until)
        .context("Invalid date range")?;

    let mut targets = Vec::new();
    for repo in &cli.repos {
        let repo_ref: RepoRef = repo
            .parse()
            .with_context(|| format!("Invalid --repo value '{}'", repo))?;
        targets.push(Target::GitHub(repo_ref));
    }
    let locals = if cli.locals.is_empty() && cli.repos.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.locals.clone()
    };
    for path in locals {
        let source = LocalSource::open(&path)
            .with_context(|| format!("Not a git repository: {}", path.display()))?;
        targets.push(Target::Local(source));
    }

    check_claude_installed()
        .await
        .context("Claude Code CLI is required")?;

    let github = if cli.repos.is_empty() {
        None
    } else {
        let token = get_github_token().context("GitHub authentication is required for --repo")?;
        Some(GitHubSource::new(&token).context("Failed to create GitHub client")?)
    };

    let provider = ClaudeProvider::new(ModelConfig {
        fast: cli.fast_model.clone(),
        detailed: cli.detailed_model.clone(),
    });
    info!(
        "Using {} for classification and {} for detailed analysis",
        provider.models().fast,
        provider.models().detailed
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; finishing the current request and stopping");
                cancel.cancel();
            }
        }
    });

    let mut reports = Vec::new();
    let mut failures = 0;

    for target in &targets {
        if cancel.is_cancelled() {
            break;
        }

        let result = match (target, &github) {
            (Target::GitHub(repo), Some(github)) => {
                let meta = github.fetch_repo_meta(repo).await.unwrap_or_else(|e| {
                    warn!("Could not fetch metadata for {}: {}", repo, e);
                    RepoMeta::named(repo.full_name())
                });
                analyze_repo(
                    github,
                    repo,
                    &meta,
                    &filter,
                    &options,
                    &provider,
                    &cancel,
                )
                .await
            }
            (Target::GitHub(repo), None) => {
                Err(anyhow::anyhow!("No GitHub client available for {}", repo))
            }
            (Target::Local(source), _) => {
                let repo = source.repo_ref();
                let meta = RepoMeta::named(repo.full_name());
                analyze_repo(
                    source,
                    &repo,
                    &meta,
                    &filter,
                    &options,
                    &provider,
                    &cancel,
                )
                .await
            }
        };

        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialize results")?
        );
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if failures > 0 {
        bail!("{} of {} repositories could not be analyzed", failures, targets.len());
    }
    Ok(())
}

async fn analyze_repo(
    source: &dyn CommitSource,
    repo: &RepoRef,
    meta: &RepoMeta,
    filter: &CommitFilter,
    options: &BatchOptions,
    llm: &dyn CompletionProvider,
    cancel: &CancellationToken,
) -> Result<RepoReport> {
    info!("Fetching commits for {}", repo);
    let commits = source
        .list_commits(repo, filter)
        .await
        .with_context(|| format!("Failed to list commits for {}", repo))?;

    let total_commits = commits.len();
    let batches = batch_commits(commits, options)?;
    info!("Grouped {} commits into {} batches", total_commits, batches.len());

    let mut usage = TokenUsage::default();
    let run = analyze_batches(batches, repo, source, llm, &mut usage, cancel).await;
    let stats = get_stats(&run.analyses);

    let (summary, summary_error) = if run.cancelled || run.analyses.is_empty() {
        (None, None)
    } else {
        match summarize(&run.analyses, meta, llm, &mut usage).await {
            Ok(summary) => (Some(summary.text), None),
            Err(e) => {
                warn!("Summary failed for {}: {}", repo, e);
                (None, Some(e.summary()))
            }
        }
    };

    Ok(RepoReport {
        repository: repo.full_name(),
        stats,
        summary,
        summary_error,
        usage,
        cancelled: run.cancelled,
        analyses: run.analyses,
    })
}

fn print_report(report: &RepoReport) {
    let stats = &report.stats;
    println!("== {} ==", report.repository);

    if stats.total_batches == 0 {
        println!("No commits found.\n");
        return;
    }

    println!(
        "{} commits in {} batches; {} important, {} analyzed in detail",
        stats.total_commits, stats.total_batches, stats.important_count, stats.detailed_count
    );
    let categories: Vec<String> = stats
        .by_category
        .iter()
        .map(|(category, count)| format!("{} {}", category, count))
        .collect();
    println!("By category: {}", categories.join(", "));
    println!(
        "Tokens: {} across {} requests",
        report.usage.total_tokens(),
        report.usage.requests
    );
    if report.cancelled {
        println!("(interrupted: results are partial)");
    }

    println!();
    match (&report.summary, &report.summary_error) {
        (Some(summary), _) => println!("{}\n", summary),
        (None, Some(err)) => println!("Summary unavailable: {}\n", err),
        (None, None) => {}
    }

    println!("Batches:");
    for analysis in &report.analyses {
        let marker = if analysis.is_degraded() { "!" } else { " " };
        println!(
            "{} [{} {}/5] {} {} ({} commits)",
            marker,
            analysis.category,
            analysis.importance,
            analysis.batch.start_date.format("%Y-%m-%d"),
            analysis.description,
            analysis.batch.len()
        );
        if let Some(detail) = &analysis.detailed_analysis {
            for line in detail.lines().filter(|l| !l.trim().is_empty()) {
                println!("      {}", line);
            }
        }
        if let Some(err) = &analysis.error {
            println!("      ! classification fell back to heuristics: {}", err);
        }
        if let Some(err) = &analysis.detailed_error {
            println!("      ! detailed analysis failed: {}", err);
        }
    }
    println!();
}
