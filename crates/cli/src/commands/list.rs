//! `ghdocs list`: rank a repository's documentation without fetching it.

use std::fmt::Write;

use ghdocs_config::AppConfig;
use ghdocs_retrieval::{DocumentListing, RetrievalOrchestrator};

use super::discover::{github_source, parse_repo};

pub async fn run(
    repo: String,
    branch: Option<String>,
    context: Option<String>,
    all: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let repo = parse_repo(&repo, branch)?;
    let orchestrator = RetrievalOrchestrator::from_config(github_source(&config)?, &config);

    let listing = orchestrator.list(&repo, context.as_deref(), all).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print!("{}", render_listing(&listing));
    }
    Ok(())
}

pub fn render_listing(listing: &DocumentListing) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "📂 {}: {} documentation file(s)",
        listing.repository,
        listing.found.len()
    );
    for document in &listing.classified {
        let _ = writeln!(out, "  {:<11} {}", document.tier.label(), document.path());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghdocs_core::{CandidatePath, ClassifiedPath, RelevanceTier, RepositoryRef};

    #[test]
    fn listing_shows_tier_per_path() {
        let readme = CandidatePath::from_path("README.md").unwrap();
        let notes = CandidatePath::from_path("notes/ideas.md").unwrap();
        let listing = DocumentListing {
            repository: RepositoryRef::new("acme", "widgets", "main"),
            found: vec![readme.clone(), notes.clone()],
            classified: vec![
                ClassifiedPath::new(readme, RelevanceTier::Essential),
                ClassifiedPath::new(notes, RelevanceTier::Additional),
            ],
        };

        let text = render_listing(&listing);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "📂 acme/widgets@main: 2 documentation file(s)");
        assert_eq!(lines[1], "  Essential   README.md");
        assert_eq!(lines[2], "  Additional  notes/ideas.md");
    }
}
