//! Document classifier: assigns relevance tiers and picks what to fetch.
//!
//! Tiering is an ordered list of (pattern, tier) rules evaluated top to
//! bottom against the file stem; the first match wins and anything left
//! over is `Additional`. A context string only re-orders documents inside
//! their tier. Everything here is pure and deterministic.

use ghdocs_core::{CandidatePath, ClassifiedPath, RelevanceTier};

/// How a keyword is matched against a compacted file stem.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Pattern {
    fn matches(&self, stem: &str) -> bool {
        match self {
            Pattern::Exact(k) => stem == *k,
            Pattern::Prefix(k) => stem.starts_with(k),
        }
    }
}

/// Keywords are written without separators: `gettingstarted` matches
/// `getting-started`, `Getting_Started` and `getting started`.
const RULES: &[(Pattern, RelevanceTier)] = &[
    (Pattern::Exact("readme"), RelevanceTier::Essential),
    (Pattern::Exact("gettingstarted"), RelevanceTier::Essential),
    (Pattern::Exact("quickstart"), RelevanceTier::Essential),
    (Pattern::Prefix("install"), RelevanceTier::Essential),
    (Pattern::Prefix("setup"), RelevanceTier::Essential),
    (Pattern::Prefix("tutorial"), RelevanceTier::Guide),
    (Pattern::Prefix("guide"), RelevanceTier::Guide),
    (Pattern::Prefix("howto"), RelevanceTier::Guide),
    (Pattern::Prefix("example"), RelevanceTier::Guide),
    (Pattern::Prefix("api"), RelevanceTier::Reference),
    (Pattern::Prefix("reference"), RelevanceTier::Reference),
    (Pattern::Prefix("configuration"), RelevanceTier::Reference),
    (Pattern::Prefix("deployment"), RelevanceTier::Reference),
];

/// Context words that imply further path keywords.
const CONTEXT_SYNONYMS: &[(&str, &[&str])] = &[
    ("learn", &["tutorial", "guide", "getting-started", "quickstart", "example", "intro"]),
    ("beginner", &["tutorial", "getting-started", "quickstart", "intro"]),
    ("deploy", &["deploy", "docker", "kubernetes", "production", "hosting"]),
    ("production", &["deploy", "production", "performance"]),
    ("api", &["api", "reference"]),
    ("reference", &["reference", "api"]),
    ("config", &["config", "settings", "options"]),
    ("test", &["test"]),
    ("troubleshoot", &["troubleshoot", "faq", "debug"]),
    ("migrat", &["migrat", "upgrad", "changelog"]),
    ("upgrad", &["migrat", "upgrad", "changelog"]),
];

/// Lowercase alphanumerics only.
fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The tier the rule list assigns to `candidate`.
pub fn tier_for(candidate: &CandidatePath) -> RelevanceTier {
    let stem = compact(&candidate.file_stem());
    RULES
        .iter()
        .find(|(pattern, _)| pattern.matches(&stem))
        .map(|(_, tier)| *tier)
        .unwrap_or(RelevanceTier::Additional)
}

/// Path keywords derived from a free-form context string.
///
/// Tokens shorter than three characters are dropped; known words pull in
/// their synonyms. Output is deduplicated and in first-seen order.
pub fn context_keywords(context: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    let mut push = |k: &str| {
        if !keywords.iter().any(|existing| existing == k) {
            keywords.push(k.to_string());
        }
    };

    for token in context
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 3)
    {
        push(token.as_str());
        for (root, synonyms) in CONTEXT_SYNONYMS {
            if token.starts_with(root) {
                for &synonym in *synonyms {
                    push(synonym);
                }
            }
        }
    }
    keywords
}

fn matches_context(path: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let lower = path.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// Assign a tier to every path and order by priority.
///
/// With `fetch_all`, every path is `Essential` and the input order is kept.
/// Otherwise the output is ordered by tier; inside a tier, paths matching
/// the context come first, and ties keep tree order.
pub fn classify(
    paths: &[CandidatePath],
    context: Option<&str>,
    fetch_all: bool,
) -> Vec<ClassifiedPath> {
    if fetch_all {
        return paths
            .iter()
            .map(|c| ClassifiedPath::new(c.clone(), RelevanceTier::Essential))
            .collect();
    }

    let keywords = context.map(context_keywords).unwrap_or_default();

    let mut classified: Vec<(ClassifiedPath, bool)> = paths
        .iter()
        .map(|c| {
            let relevant = matches_context(&c.path, &keywords);
            (ClassifiedPath::new(c.clone(), tier_for(c)), relevant)
        })
        .collect();

    // Stable: equal keys keep tree order.
    classified.sort_by_key(|(c, relevant)| (c.tier, !relevant));
    classified.into_iter().map(|(c, _)| c).collect()
}

/// What, beyond the core tiers, gets fetched.
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    /// Fetch every `Additional` document, not only context matches
    pub include_additional: bool,

    /// Keep at most this many documents
    pub max_documents: Option<usize>,
}

/// Pick the documents to fetch from a classified list, keeping its order.
///
/// `Essential`, `Guide` and `Reference` are always picked. `Additional`
/// documents are picked when they match the context or the policy asks
/// for them.
pub fn select(
    classified: &[ClassifiedPath],
    context: Option<&str>,
    policy: &SelectionPolicy,
) -> Vec<ClassifiedPath> {
    let keywords = context.map(context_keywords).unwrap_or_default();
    let limit = policy.max_documents.unwrap_or(usize::MAX);

    classified
        .iter()
        .filter(|c| match c.tier {
            RelevanceTier::Essential | RelevanceTier::Guide | RelevanceTier::Reference => true,
            RelevanceTier::Additional => {
                policy.include_additional || matches_context(c.path(), &keywords)
            }
            RelevanceTier::Excluded => false,
        })
        .take(limit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(paths: &[&str]) -> Vec<CandidatePath> {
        paths
            .iter()
            .map(|p| CandidatePath::from_path(*p).unwrap())
            .collect()
    }

    fn tiers(classified: &[ClassifiedPath]) -> Vec<(&str, RelevanceTier)> {
        classified.iter().map(|c| (c.path(), c.tier)).collect()
    }

    #[test]
    fn rule_priority_first_match_wins() {
        let cases = [
            ("README.md", RelevanceTier::Essential),
            ("docs/Getting-Started.md", RelevanceTier::Essential),
            ("docs/getting_started.mdx", RelevanceTier::Essential),
            ("QUICKSTART.md", RelevanceTier::Essential),
            ("docs/installation.rst", RelevanceTier::Essential),
            ("setup-windows.md", RelevanceTier::Essential),
            ("docs/tutorial-01.md", RelevanceTier::Guide),
            ("guides.md", RelevanceTier::Guide),
            ("how-to-deploy.md", RelevanceTier::Guide),
            ("examples.md", RelevanceTier::Guide),
            ("docs/api-reference.md", RelevanceTier::Reference),
            ("reference.txt", RelevanceTier::Reference),
            ("configuration.md", RelevanceTier::Reference),
            ("deployment.md", RelevanceTier::Reference),
            ("docs/architecture.md", RelevanceTier::Additional),
            ("CHANGELOG.md", RelevanceTier::Additional),
            ("readme-old.md", RelevanceTier::Additional),
        ];
        for (path, expected) in cases {
            let c = CandidatePath::from_path(path).unwrap();
            assert_eq!(tier_for(&c), expected, "{path}");
        }
    }

    #[test]
    fn never_assigns_excluded() {
        let paths = candidates(&["a.md", "LICENSE.md", "robots.txt", "x/y/z.rst"]);
        assert!(
            classify(&paths, Some("anything"), false)
                .iter()
                .all(|c| c.tier != RelevanceTier::Excluded)
        );
    }

    #[test]
    fn fetch_all_is_identity_in_essential() {
        let paths = candidates(&["z.md", "docs/api.md", "README.md", "blog/post.md"]);
        let out = classify(&paths, Some("deployment"), true);
        assert_eq!(out.len(), paths.len());
        for (c, original) in out.iter().zip(&paths) {
            assert_eq!(&c.candidate, original);
            assert_eq!(c.tier, RelevanceTier::Essential);
        }
    }

    #[test]
    fn output_ordered_by_tier_with_tree_order_ties() {
        let paths = candidates(&[
            "docs/api.md",
            "notes.md",
            "docs/guide-b.md",
            "README.md",
            "docs/guide-a.md",
            "INSTALL.md",
        ]);
        let out = classify(&paths, None, false);
        assert_eq!(
            tiers(&out),
            vec![
                ("README.md", RelevanceTier::Essential),
                ("INSTALL.md", RelevanceTier::Essential),
                ("docs/guide-b.md", RelevanceTier::Guide),
                ("docs/guide-a.md", RelevanceTier::Guide),
                ("docs/api.md", RelevanceTier::Reference),
                ("notes.md", RelevanceTier::Additional),
            ]
        );
    }

    #[test]
    fn context_moves_matches_to_front_of_their_tier_only() {
        let paths = candidates(&[
            "docs/guide-basics.md",
            "docs/guide-docker.md",
            "docs/api.md",
            "deploy/kubernetes.md",
            "notes.md",
            "README.md",
        ]);
        let out = classify(&paths, Some("deployment"), false);
        assert_eq!(
            tiers(&out),
            vec![
                ("README.md", RelevanceTier::Essential),
                ("docs/guide-docker.md", RelevanceTier::Guide),
                ("docs/guide-basics.md", RelevanceTier::Guide),
                ("docs/api.md", RelevanceTier::Reference),
                ("deploy/kubernetes.md", RelevanceTier::Additional),
                ("notes.md", RelevanceTier::Additional),
            ]
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let paths = candidates(&[
            "docs/deploy.md",
            "README.md",
            "guide.md",
            "docs/examples/basic.md",
            "api.md",
            "misc.txt",
        ]);
        let first = classify(&paths, Some("learning deployment"), false);
        let second = classify(&paths, Some("learning deployment"), false);
        assert_eq!(first, second);
    }

    #[test]
    fn context_keywords_expand_synonyms() {
        let k = context_keywords("Learning");
        assert_eq!(k[0], "learning");
        assert!(k.contains(&"tutorial".to_string()));
        assert!(k.contains(&"getting-started".to_string()));

        let k = context_keywords("deploy to k8s, in production");
        assert!(k.contains(&"docker".to_string()));
        assert!(k.contains(&"production".to_string()));
        assert!(!k.contains(&"to".to_string()));
        let unique: std::collections::HashSet<_> = k.iter().collect();
        assert_eq!(unique.len(), k.len());

        assert!(context_keywords("").is_empty());
        assert!(context_keywords("a b").is_empty());
    }

    #[test]
    fn select_skips_unmatched_additional() {
        let paths = candidates(&["README.md", "docs/tutorial.md", "blog/post.md", "docs/learning-path.md"]);
        let classified = classify(&paths, Some("learning"), false);
        let selected = select(&classified, Some("learning"), &SelectionPolicy::default());
        let picked: Vec<_> = selected.iter().map(|c| c.path()).collect();
        assert_eq!(
            picked,
            vec!["README.md", "docs/tutorial.md", "docs/learning-path.md"]
        );
    }

    #[test]
    fn select_policy_include_additional_and_limit() {
        let paths = candidates(&["README.md", "notes.md", "api.md", "misc.md"]);
        let classified = classify(&paths, None, false);

        let all = select(
            &classified,
            None,
            &SelectionPolicy {
                include_additional: true,
                max_documents: None,
            },
        );
        assert_eq!(all.len(), 4);

        let capped = select(
            &classified,
            None,
            &SelectionPolicy {
                include_additional: true,
                max_documents: Some(2),
            },
        );
        let picked: Vec<_> = capped.iter().map(|c| c.path()).collect();
        assert_eq!(picked, vec!["README.md", "api.md"]);
    }
}
