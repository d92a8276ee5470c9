//! Retrieval orchestrator: the discover → filter → fetch → summarize pipeline.
//!
//! The orchestrator is the only caller of the tree reader, classifier and
//! fetcher, and the only place that decides concurrency, retry policy and
//! the overall deadline. Every stage transition is logged and published on
//! the event bus.

use chrono::Utc;
use ghdocs_config::AppConfig;
use ghdocs_core::error::{Error, Result};
use ghdocs_core::{
    CandidatePath, ClassifiedPath, EventBus, PipelineStage, RepositoryRef, RepositorySource,
    RetrievalEvent, RetrievalSummary,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{error, info};

use crate::cancel::CancelToken;
use crate::classifier::{self, SelectionPolicy};
use crate::fetcher::{ContentFetcher, DEFAULT_CONCURRENCY, RetryPolicy};
use crate::tree::{ExclusionRules, RepositoryTreeReader};

/// The classified documentation of a repository, without content.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentListing {
    pub repository: RepositoryRef,
    pub found: Vec<CandidatePath>,
    pub classified: Vec<ClassifiedPath>,
}

pub struct RetrievalOrchestrator {
    reader: RepositoryTreeReader,
    fetcher: ContentFetcher,
    concurrency: usize,
    deadline: Option<Duration>,
    selection: SelectionPolicy,
    events: Arc<EventBus>,
}

impl RetrievalOrchestrator {
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        let events = Arc::new(EventBus::default());
        Self {
            reader: RepositoryTreeReader::new(Arc::clone(&source)),
            fetcher: ContentFetcher::new(source).with_events(Arc::clone(&events)),
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
            selection: SelectionPolicy::default(),
            events,
        }
    }

    /// Build an orchestrator with every knob taken from `config`.
    pub fn from_config(source: Arc<dyn RepositorySource>, config: &AppConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.fetch, config.github.request_timeout_secs);
        Self::new(source)
            .with_exclusions(ExclusionRules::with_extra(&config.classifier.extra_exclusions))
            .with_retry_policy(retry)
            .with_concurrency(config.fetch.concurrency)
            .with_deadline(config.fetch.deadline_secs.map(Duration::from_secs))
            .with_selection(SelectionPolicy {
                include_additional: config.classifier.include_additional,
                max_documents: config.fetch.max_documents,
            })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.reader = self.reader.with_exclusions(exclusions);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.fetcher = self.fetcher.with_retry_policy(retry);
        self
    }

    /// Receive stage and per-file events of subsequent runs.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RetrievalEvent>> {
        self.events.subscribe()
    }

    /// Discover, rank and fetch the documentation of `repo`.
    ///
    /// Only repository-level problems are errors. Per-file failures are
    /// recorded in the summary.
    pub async fn discover(
        &self,
        repo: &RepositoryRef,
        context: Option<&str>,
        fetch_all: bool,
    ) -> Result<RetrievalSummary> {
        self.discover_with_cancel(repo, context, fetch_all, &CancelToken::new())
            .await
    }

    /// [`discover`](Self::discover) that stops when `cancel` fires.
    ///
    /// The configured deadline covers the whole call, from resolving the
    /// branch onwards. If either stops the run during fetching, the summary
    /// keeps whatever had completed. Before fetching there is nothing to
    /// keep, so the run fails with [`Error::Cancelled`].
    pub async fn discover_with_cancel(
        &self,
        repo: &RepositoryRef,
        context: Option<&str>,
        fetch_all: bool,
        cancel: &CancelToken,
    ) -> Result<RetrievalSummary> {
        let started_at = Utc::now();
        let deadline = self.deadline.map(|d| Instant::now() + d);
        let mut stages = StageTracker::new(repo, &self.events);

        let listing = tokio::select! {
            biased;
            _ = cancel.stopped(deadline) => None,
            listing = self.classified(repo, context, fetch_all, &mut stages) => Some(listing),
        };
        let listing = listing.unwrap_or_else(|| {
            Err(Error::Cancelled {
                stage: stages.current,
            })
        });
        let (resolved, found, classified) = match listing {
            Ok(listing) => listing,
            Err(e) => return Err(stages.fail(e)),
        };

        let selected = if fetch_all {
            classified
        } else {
            classifier::select(&classified, context, &self.selection)
        };

        stages.enter(PipelineStage::Fetching);
        let candidates: Vec<CandidatePath> = selected.iter().map(|c| c.candidate.clone()).collect();
        let results = self
            .fetcher
            .fetch_all_until(&candidates, &resolved, self.concurrency, cancel, deadline)
            .await;

        stages.enter(PipelineStage::Summarizing);
        let cancelled = results.len() < selected.len();
        let summary = RetrievalSummary {
            repository: resolved,
            context: context.map(String::from),
            found,
            selected,
            results,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            repository = %summary.repository,
            found = summary.found.len(),
            selected = summary.selected.len(),
            succeeded = summary.succeeded().count(),
            failed = summary.failed().count(),
            cancelled,
            "Discovery finished"
        );
        stages.enter(PipelineStage::Done);
        Ok(summary)
    }

    /// Resolve, list and classify `repo` without fetching anything.
    pub async fn list(
        &self,
        repo: &RepositoryRef,
        context: Option<&str>,
        fetch_all: bool,
    ) -> Result<DocumentListing> {
        let mut stages = StageTracker::new(repo, &self.events);
        let listing = self.classified(repo, context, fetch_all, &mut stages).await;
        match listing {
            Ok((repository, found, classified)) => {
                stages.enter(PipelineStage::Done);
                Ok(DocumentListing {
                    repository,
                    found,
                    classified,
                })
            }
            Err(e) => Err(stages.fail(e)),
        }
    }

    async fn classified(
        &self,
        repo: &RepositoryRef,
        context: Option<&str>,
        fetch_all: bool,
        stages: &mut StageTracker<'_>,
    ) -> Result<(RepositoryRef, Vec<CandidatePath>, Vec<ClassifiedPath>)> {
        stages.enter(PipelineStage::Resolving);
        let resolved = self.reader.resolve(repo).await?;
        stages.rename(&resolved);

        stages.enter(PipelineStage::Listing);
        let found = self.reader.list_documentation_files(&resolved).await?;

        stages.enter(PipelineStage::Classifying);
        let classified = classifier::classify(&found, context, fetch_all);
        Ok((resolved, found, classified))
    }
}

/// Logs and publishes stage transitions for one run.
struct StageTracker<'a> {
    repository: String,
    current: PipelineStage,
    events: &'a EventBus,
}

impl<'a> StageTracker<'a> {
    fn new(repo: &RepositoryRef, events: &'a EventBus) -> Self {
        Self {
            repository: repo.to_string(),
            current: PipelineStage::Resolving,
            events,
        }
    }

    fn rename(&mut self, repo: &RepositoryRef) {
        self.repository = repo.to_string();
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.current = stage;
        info!(repository = %self.repository, stage = %stage, "Entering stage");
        self.events.publish(RetrievalEvent::StageEntered {
            repository: self.repository.clone(),
            stage,
            timestamp: Utc::now(),
        });
    }

    /// Record a fatal error raised in the current stage and hand it back.
    fn fail(&mut self, e: Error) -> Error {
        let stage = self.current;
        error!(repository = %self.repository, stage = %stage, error = %e, "Discovery failed");
        self.events.publish(RetrievalEvent::RetrievalFailed {
            repository: self.repository.clone(),
            stage,
            error_message: e.to_string(),
            timestamp: Utc::now(),
        });
        self.enter(PipelineStage::Failed);
        e
    }
}
