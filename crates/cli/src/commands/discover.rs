//! `ghdocs discover`: find, rank and fetch a repository's documentation.

use std::fmt::Write;
use std::sync::Arc;

use ghdocs_config::AppConfig;
use ghdocs_core::{RepositoryRef, RepositorySource, RetrievalSummary};
use ghdocs_github::GitHubClient;
use ghdocs_retrieval::{CancelToken, RetrievalOrchestrator};
use tracing::warn;

pub struct DiscoverArgs {
    pub repo: String,
    pub branch: Option<String>,
    pub context: Option<String>,
    pub all: bool,
    pub concurrency: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub max_documents: Option<usize>,
    pub json: bool,
}

pub async fn run(args: DiscoverArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(concurrency) = args.concurrency {
        config.fetch.concurrency = concurrency;
    }
    if args.deadline_secs.is_some() {
        config.fetch.deadline_secs = args.deadline_secs;
    }
    if args.max_documents.is_some() {
        config.fetch.max_documents = args.max_documents;
    }
    config.validate()?;

    let repo = parse_repo(&args.repo, args.branch)?;
    let orchestrator = RetrievalOrchestrator::from_config(github_source(&config)?, &config);

    // Ctrl-C stops any stage. Once fetching, whatever finished is still reported
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping discovery");
            on_interrupt.cancel();
        }
    });

    let summary = orchestrator
        .discover_with_cancel(&repo, args.context.as_deref(), args.all, &cancel)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

/// Parse a repository argument, letting `--branch` override any `@branch`.
pub fn parse_repo(
    input: &str,
    branch: Option<String>,
) -> Result<RepositoryRef, Box<dyn std::error::Error>> {
    let repo: RepositoryRef = input.parse()?;
    Ok(match branch {
        Some(branch) if !branch.trim().is_empty() => repo.with_branch(branch.trim()),
        _ => repo,
    })
}

pub fn github_source(
    config: &AppConfig,
) -> Result<Arc<dyn RepositorySource>, Box<dyn std::error::Error>> {
    Ok(Arc::new(GitHubClient::from_config(&config.github)?))
}

/// Human-readable summary grouped by tier.
pub fn render_summary(summary: &RetrievalSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "📚 {}: {} found, {} selected",
        summary.repository,
        summary.found.len(),
        summary.selected.len()
    );
    if let Some(context) = &summary.context {
        let _ = writeln!(out, "   Context: {context}");
    }

    for group in summary.by_tier() {
        let _ = writeln!(out, "\n{}", group.tier.label());
        for (document, result) in group.documents {
            let line = match result {
                Some(r) => match (r.content(), r.error()) {
                    (Some(content), _) => {
                        format!("  ✅ {} ({})", document.path(), human_size(content.len()))
                    }
                    (None, Some(kind)) => format!("  ❌ {}: {kind}", document.path()),
                    (None, None) => format!("  ❔ {}", document.path()),
                },
                None => format!("  ⏸️  {} (not fetched)", document.path()),
            };
            let _ = writeln!(out, "{line}");
        }
    }

    let succeeded = summary.succeeded().count();
    let failed = summary.failed().count();
    let _ = writeln!(out);
    if summary.selected.is_empty() {
        let _ = writeln!(out, "No documentation selected.");
    } else {
        let _ = write!(out, "Fetched {succeeded}/{} documents", summary.selected.len());
        if failed > 0 {
            let _ = write!(out, ", {failed} failed");
        }
        if summary.cancelled {
            let _ = write!(out, " (stopped early)");
        }
        let _ = writeln!(out);
    }
    out
}

fn human_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
