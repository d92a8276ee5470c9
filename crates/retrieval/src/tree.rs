//! Repository tree reader.
//!
//! Resolves the branch, lists the recursive tree in one call, and keeps the
//! blobs that look like documentation, in tree order.

use ghdocs_core::error::{Error, Result, SourceError};
use ghdocs_core::{CandidatePath, RepositoryRef, RepositorySource};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Case-insensitive substrings that disqualify a path.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "code_of_conduct",
    "code-of-conduct",
    "contributing",
    "license",
    "claude.md",
    "agents.md",
    "gemini.md",
    "copilot-instructions",
    ".cursorrules",
    "/blog/",
    "robots.txt",
];

/// Which documentation files are never worth fetching.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    patterns: Vec<String>,
}

impl ExclusionRules {
    /// The built-in patterns plus `extra`.
    pub fn with_extra(extra: &[String]) -> Self {
        let patterns = DEFAULT_EXCLUSIONS
            .iter()
            .map(|p| p.to_string())
            .chain(
                extra
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty()),
            )
            .collect();
        Self { patterns }
    }

    /// Patterns are matched against the path with a leading `/`, so
    /// directory patterns like `/blog/` also hit top-level directories.
    pub fn is_excluded(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        if is_llms_txt(&lower) {
            return true;
        }
        let rooted = format!("/{lower}");
        self.patterns.iter().any(|p| rooted.contains(p.as_str()))
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

/// `llms.txt`, `llms-full.txt`, `llms_small.txt`, ...
fn is_llms_txt(lower_path: &str) -> bool {
    let file_name = lower_path.rsplit('/').next().unwrap_or(lower_path);
    file_name.starts_with("llms") && file_name.ends_with(".txt")
}

/// Reads documentation candidates from a [`RepositorySource`].
pub struct RepositoryTreeReader {
    source: Arc<dyn RepositorySource>,
    exclusions: ExclusionRules,
}

impl RepositoryTreeReader {
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        Self {
            source,
            exclusions: ExclusionRules::default(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Return `repo` pinned to a concrete branch, looking up the default
    /// branch if none was given.
    pub async fn resolve(&self, repo: &RepositoryRef) -> Result<RepositoryRef> {
        if repo.is_resolved() {
            return Ok(repo.clone());
        }

        let branch = self
            .source
            .default_branch(repo.owner(), repo.name())
            .await
            .map_err(|e| match e {
                SourceError::NotFound(_) | SourceError::Forbidden(_) => Error::RepositoryNotFound {
                    owner: repo.owner().to_string(),
                    name: repo.name().to_string(),
                },
                other => listing_error(other),
            })?;

        if branch.is_empty() {
            return Err(Error::Api {
                status_code: 200,
                message: format!("{} reported an empty default branch", repo.full_name()),
            });
        }

        debug!(repository = %repo.full_name(), branch = %branch, "Resolved default branch");
        Ok(repo.with_branch(branch))
    }

    /// List documentation files of `repo` in tree order.
    pub async fn list_documentation_files(&self, repo: &RepositoryRef) -> Result<Vec<CandidatePath>> {
        let repo = self.resolve(repo).await?;

        let listing = self
            .source
            .list_tree(repo.owner(), repo.name(), repo.branch())
            .await
            .map_err(|e| match e {
                SourceError::NotFound(_) => Error::BranchNotFound {
                    repository: repo.full_name(),
                    branch: repo.branch().to_string(),
                },
                SourceError::Forbidden(_) => Error::RepositoryNotFound {
                    owner: repo.owner().to_string(),
                    name: repo.name().to_string(),
                },
                other => listing_error(other),
            })?;

        if listing.truncated {
            warn!(
                repository = %repo,
                entries = listing.entries.len(),
                "Tree listing was truncated by the host; some documentation may be missing"
            );
        }

        let total = listing.entries.len();
        let candidates: Vec<CandidatePath> = listing
            .entries
            .into_iter()
            .filter(|entry| entry.is_blob())
            .filter_map(|entry| CandidatePath::from_path(entry.path))
            .filter(|candidate| !self.exclusions.is_excluded(&candidate.path))
            .collect();

        info!(
            repository = %repo,
            entries = total,
            documents = candidates.len(),
            "Listed documentation files"
        );
        Ok(candidates)
    }
}

fn listing_error(e: SourceError) -> Error {
    match e {
        SourceError::RateLimited { retry_after_secs } => Error::Api {
            status_code: 429,
            message: format!("rate limited, retry after {retry_after_secs}s"),
        },
        SourceError::Server {
            status_code,
            message,
        } => Error::Api {
            status_code,
            message,
        },
        SourceError::Decode(message) => Error::Api {
            status_code: 200,
            message,
        },
        SourceError::Timeout(message) | SourceError::Network(message) => Error::Network(message),
        SourceError::NotFound(message) | SourceError::Forbidden(message) => Error::Api {
            status_code: 404,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ghdocs_core::{TreeEntry, TreeListing};

    struct StaticTree {
        default_branch: Option<&'static str>,
        branch: &'static str,
        entries: Vec<TreeEntry>,
    }

    #[async_trait]
    impl RepositorySource for StaticTree {
        fn name(&self) -> &str {
            "static"
        }

        async fn default_branch(&self, owner: &str, name: &str) -> std::result::Result<String, SourceError> {
            self.default_branch
                .map(String::from)
                .ok_or_else(|| SourceError::NotFound(format!("{owner}/{name}")))
        }

        async fn list_tree(
            &self,
            _owner: &str,
            _name: &str,
            branch: &str,
        ) -> std::result::Result<TreeListing, SourceError> {
            if branch == self.branch {
                Ok(TreeListing::new(self.entries.clone()))
            } else {
                Err(SourceError::NotFound(branch.into()))
            }
        }

        async fn fetch_raw(
            &self,
            _owner: &str,
            _name: &str,
            _branch: &str,
            path: &str,
        ) -> std::result::Result<String, SourceError> {
            Err(SourceError::NotFound(path.into()))
        }
    }

    fn reader(entries: Vec<TreeEntry>) -> RepositoryTreeReader {
        RepositoryTreeReader::new(Arc::new(StaticTree {
            default_branch: Some("main"),
            branch: "main",
            entries,
        }))
    }

    #[test]
    fn exclusion_patterns_are_case_insensitive_substrings() {
        let rules = ExclusionRules::default();
        for path in [
            "CODE_OF_CONDUCT.md",
            "docs/Contributing.md",
            "LICENSE.txt",
            "license-apache.md",
            "CLAUDE.md",
            "packages/web/AGENTS.md",
            ".github/copilot-instructions.md",
            "website/blog/2024-release.md",
            "blog/post.md",
            "Blog/Launch.MD",
            "public/robots.txt",
            "llms.txt",
            "site/llms-full.txt",
        ] {
            assert!(rules.is_excluded(path), "{path} should be excluded");
        }
        for path in [
            "README.md",
            "docs/guide.md",
            "blogging.md",
            "docs/blog.md",
            "llms.md",
            "notes.txt",
        ] {
            assert!(!rules.is_excluded(path), "{path} should be kept");
        }
    }

    #[test]
    fn extra_exclusions_are_added() {
        let rules = ExclusionRules::with_extra(&["CHANGELOG".into(), "  ".into()]);
        assert!(rules.is_excluded("CHANGELOG.md"));
        assert!(rules.is_excluded("LICENSE"));
        assert!(!rules.is_excluded("README.md"));
    }

    #[tokio::test]
    async fn lists_documentation_blobs_in_tree_order() {
        let reader = reader(vec![
            TreeEntry::blob("README.md"),
            TreeEntry::tree("docs"),
            TreeEntry::blob("docs/zeta.rst"),
            TreeEntry::blob("docs/alpha.MDX"),
            TreeEntry::blob("src/lib.rs"),
            TreeEntry::blob("CONTRIBUTING.md"),
            TreeEntry::blob("History.rdoc"),
            TreeEntry::blob("notes.txt"),
        ]);

        let files = reader
            .list_documentation_files(&RepositoryRef::new("o", "n", "main"))
            .await
            .unwrap();
        let paths: Vec<_> = files.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["README.md", "docs/zeta.rst", "docs/alpha.MDX", "History.rdoc", "notes.txt"]
        );
    }

    #[tokio::test]
    async fn tree_entries_named_like_docs_are_skipped() {
        let reader = reader(vec![TreeEntry::tree("guide.md"), TreeEntry::blob("guide.md/README.md")]);
        let files = reader
            .list_documentation_files(&RepositoryRef::new("o", "n", "main"))
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "guide.md/README.md");
    }

    #[tokio::test]
    async fn empty_branch_resolves_default() {
        let reader = reader(vec![TreeEntry::blob("README.md")]);
        let resolved = reader
            .resolve(&RepositoryRef::unresolved("o", "n"))
            .await
            .unwrap();
        assert_eq!(resolved.branch(), "main");

        let files = reader
            .list_documentation_files(&RepositoryRef::unresolved("o", "n"))
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn missing_repository_is_fatal() {
        let reader = RepositoryTreeReader::new(Arc::new(StaticTree {
            default_branch: None,
            branch: "main",
            entries: vec![],
        }));
        let err = reader
            .list_documentation_files(&RepositoryRef::unresolved("o", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RepositoryNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_branch_is_fatal() {
        let reader = reader(vec![TreeEntry::blob("README.md")]);
        let err = reader
            .list_documentation_files(&RepositoryRef::new("o", "n", "nope"))
            .await
            .unwrap_err();
        match err {
            Error::BranchNotFound { branch, repository } => {
                assert_eq!(branch, "nope");
                assert_eq!(repository, "o/n");
            }
            other => panic!("expected BranchNotFound, got {other:?}"),
        }
    }
}
