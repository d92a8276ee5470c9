//! Retrieval events: stage and per-file progress.
//!
//! The orchestrator publishes an event whenever it enters a stage or
//! finishes a file. Callers subscribe through the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Stages of one discovery run. Runs move strictly forward; any fatal
/// error jumps to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Resolving,
    Listing,
    Classifying,
    Fetching,
    Summarizing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Resolving => "resolving",
            PipelineStage::Listing => "listing",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Summarizing => "summarizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// All retrieval events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RetrievalEvent {
    /// The pipeline moved to a new stage
    StageEntered {
        repository: String,
        stage: PipelineStage,
        timestamp: DateTime<Utc>,
    },

    /// A file fetch finished, successfully or not
    FileFetched {
        path: String,
        success: bool,
        attempts: u32,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A fatal error ended the run
    RetrievalFailed {
        repository: String,
        stage: PipelineStage,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for retrieval events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<RetrievalEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: RetrievalEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RetrievalEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
