//! Content fetcher with bounded concurrency and retries.
//!
//! A fixed pool of worker tasks drains a shared queue of paths and writes
//! one `FetchResult` per path into a mutex-guarded map. A failing file is
//! recorded and never aborts its siblings. Transient errors are retried
//! with exponential backoff; permanent ones are recorded at once.

use chrono::Utc;
use ghdocs_config::{FetchConfig, MAX_CONCURRENCY};
use ghdocs_core::{
    CandidatePath, EventBus, FetchResult, RepositoryRef, RepositorySource, RetrievalEvent,
    SourceError,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Retry and backoff settings for transient fetch failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,

    /// Delay before the first retry; doubles each time
    pub base_delay: Duration,

    /// Cap on any single delay, including host retry-after hints
    pub max_delay: Duration,

    /// Timeout for one call to the source
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig, call_timeout_secs: u64) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_secs(config.max_backoff_secs),
            call_timeout: Some(Duration::from_secs(call_timeout_secs)),
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based). A larger retry-after
    /// hint from the host wins, up to `max_delay`.
    pub fn delay_for(&self, retry: u32, retry_after_secs: Option<u64>) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        let hinted = retry_after_secs.map(Duration::from_secs).unwrap_or_default();
        backoff.max(hinted).min(self.max_delay)
    }
}

/// Fetches raw document content from a [`RepositorySource`].
pub struct ContentFetcher {
    source: Arc<dyn RepositorySource>,
    retry: RetryPolicy,
    events: Option<Arc<EventBus>>,
}

impl ContentFetcher {
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        Self {
            source,
            retry: RetryPolicy::default(),
            events: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Publish a `FileFetched` event per completed file.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch every path in `selected` at `repo`'s branch, at most
    /// `concurrency` at a time. Always returns one result per path.
    pub async fn fetch_all(
        &self,
        selected: &[CandidatePath],
        repo: &RepositoryRef,
        concurrency: usize,
    ) -> BTreeMap<String, FetchResult> {
        self.fetch_all_until(selected, repo, concurrency, &CancelToken::new(), None)
            .await
    }

    /// Like [`fetch_all`](Self::fetch_all), but stops early when `cancel`
    /// fires or `deadline` passes. In-flight fetches are dropped; results
    /// completed before that are returned.
    pub async fn fetch_all_until(
        &self,
        selected: &[CandidatePath],
        repo: &RepositoryRef,
        concurrency: usize,
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> BTreeMap<String, FetchResult> {
        let workers = concurrency.clamp(1, MAX_CONCURRENCY).min(selected.len());
        if workers == 0 {
            return BTreeMap::new();
        }

        info!(
            repository = %repo,
            documents = selected.len(),
            workers,
            "Fetching documents"
        );

        let queue: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(
            selected.iter().map(|c| c.path.clone()).collect(),
        ));
        let results: Arc<Mutex<BTreeMap<String, FetchResult>>> =
            Arc::new(Mutex::new(BTreeMap::new()));

        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            let worker = Worker {
                id: worker_id,
                source: Arc::clone(&self.source),
                repo: repo.clone(),
                retry: self.retry.clone(),
                events: self.events.clone(),
                queue: Arc::clone(&queue),
                results: Arc::clone(&results),
                cancel: cancel.clone(),
                deadline,
            };
            tasks.spawn(worker.run());
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Fetch worker ended abnormally");
            }
        }

        let results = std::mem::take(&mut *results.lock().await);
        let failed = results.values().filter(|r| !r.is_success()).count();
        info!(
            repository = %repo,
            fetched = results.len() - failed,
            failed,
            skipped = selected.len() - results.len(),
            "Fetch stage finished"
        );
        results
    }
}

struct Worker {
    id: usize,
    source: Arc<dyn RepositorySource>,
    repo: RepositoryRef,
    retry: RetryPolicy,
    events: Option<Arc<EventBus>>,
    queue: Arc<Mutex<VecDeque<String>>>,
    results: Arc<Mutex<BTreeMap<String, FetchResult>>>,
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl Worker {
    async fn run(self) {
        loop {
            if self.should_stop() {
                break;
            }
            let Some(path) = self.queue.lock().await.pop_front() else {
                break;
            };

            let started = Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.stopped(self.deadline) => None,
                result = fetch_with_retry(self.source.as_ref(), &self.repo, &path, &self.retry) => Some(result),
            };

            let Some(result) = outcome else {
                debug!(worker = self.id, path = %path, "Fetch interrupted");
                break;
            };

            if let Some(events) = &self.events {
                events.publish(RetrievalEvent::FileFetched {
                    path: path.clone(),
                    success: result.is_success(),
                    attempts: result.attempts(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Utc::now(),
                });
            }
            self.results.lock().await.insert(path, result);
        }
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_stopped(self.deadline)
    }
}

/// Fetch one path, retrying transient failures per `retry`.
pub async fn fetch_with_retry(
    source: &dyn RepositorySource,
    repo: &RepositoryRef,
    path: &str,
    retry: &RetryPolicy,
) -> FetchResult {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let call = source.fetch_raw(repo.owner(), repo.name(), repo.branch(), path);
        let outcome = match retry.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(SourceError::Timeout(format!(
                    "{path} did not respond within {}s",
                    limit.as_secs()
                )))
            }),
            None => call.await,
        };

        match outcome {
            Ok(content) => {
                debug!(path = %path, attempt, bytes = content.len(), "Fetched document");
                return FetchResult::success(path, content, attempt);
            }
            Err(e) if e.is_transient() && attempt <= retry.max_retries => {
                let delay = retry.delay_for(attempt, e.retry_after_secs());
                warn!(
                    path = %path,
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Transient fetch failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(path = %path, attempt, error = %e, "Fetch failed");
                return FetchResult::failure(path, e.kind(), e.to_string(), attempt);
            }
        }
    }
}
