//! The categorized outcome of one discovery run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::document::{CandidatePath, ClassifiedPath, RelevanceTier};
use crate::fetch::FetchResult;
use crate::repository::RepositoryRef;

/// Everything a discovery run produced.
///
/// `found` is in tree order, `selected` in priority order. `results` is
/// keyed by path; use [`RetrievalSummary::by_tier`] for presentation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSummary {
    /// The repository, with its branch resolved
    pub repository: RepositoryRef,

    /// The context the run was ranked against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Every documentation file the tree reader kept
    pub found: Vec<CandidatePath>,

    /// What was handed to the fetcher, highest priority first
    pub selected: Vec<ClassifiedPath>,

    /// Fetch outcomes by path
    pub results: BTreeMap<String, FetchResult>,

    /// Cancellation or the deadline stopped the fetch stage early
    #[serde(default)]
    pub cancelled: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// The selected documents of one tier, in priority order.
#[derive(Debug, Clone)]
pub struct TierGroup<'a> {
    pub tier: RelevanceTier,
    pub documents: Vec<(&'a ClassifiedPath, Option<&'a FetchResult>)>,
}

impl RetrievalSummary {
    /// Group `selected` by tier, in tier order, keeping each tier's
    /// internal order. Empty tiers are omitted. A document without a
    /// result was never fetched (the run was cancelled first).
    pub fn by_tier(&self) -> Vec<TierGroup<'_>> {
        let mut groups: Vec<TierGroup<'_>> = Vec::new();
        for tier in RelevanceTier::ALL {
            let documents: Vec<_> = self
                .selected
                .iter()
                .filter(|c| c.tier == tier)
                .map(|c| (c, self.results.get(c.path())))
                .collect();
            if !documents.is_empty() {
                groups.push(TierGroup { tier, documents });
            }
        }
        groups
    }

    /// Results with content, in priority order.
    pub fn succeeded(&self) -> impl Iterator<Item = &FetchResult> {
        self.ordered_results().filter(|r| r.is_success())
    }

    /// Results with an error, in priority order.
    pub fn failed(&self) -> impl Iterator<Item = &FetchResult> {
        self.ordered_results().filter(|r| !r.is_success())
    }

    /// Selected paths that have no result at all.
    pub fn missing(&self) -> impl Iterator<Item = &ClassifiedPath> {
        self.selected
            .iter()
            .filter(|c| !self.results.contains_key(c.path()))
    }

    /// Whether some selected document has no result.
    pub fn is_partial(&self) -> bool {
        self.missing().next().is_some()
    }

    /// The tier assigned to `path`, if it was selected.
    pub fn tier_of(&self, path: &str) -> Option<RelevanceTier> {
        self.selected
            .iter()
            .find(|c| c.path() == path)
            .map(|c| c.tier)
    }

    fn ordered_results(&self) -> impl Iterator<Item = &FetchResult> {
        self.selected
            .iter()
            .filter_map(|c| self.results.get(c.path()))
    }
}
