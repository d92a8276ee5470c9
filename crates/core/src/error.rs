//! Error types for the ghdocs domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! `Error` covers failures that abort a whole retrieval; `SourceError`
//! is what a single call against the repository host can fail with.

use thiserror::Error;

use crate::event::PipelineStage;
use crate::fetch::FetchErrorKind;

/// The top-level error type for all ghdocs operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Fatal listing-stage errors ---
    #[error("Repository not found or not accessible: {owner}/{name}")]
    RepositoryNotFound { owner: String, name: String },

    #[error("Branch '{branch}' not found in {repository}")]
    BranchNotFound { repository: String, branch: String },

    #[error("Repository host error: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    // --- Input errors ---
    #[error("Invalid repository reference: {0}")]
    InvalidReference(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Cancellation ---
    /// Cancellation or the deadline hit before any document was fetched
    #[error("Discovery cancelled while {stage}")]
    Cancelled { stage: PipelineStage },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// An error from a single call against a [`RepositorySource`](crate::source::RepositorySource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited by repository host, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status: {status_code}): {message}")]
    Server { status_code: u16, message: String },

    #[error("Failed to decode content: {0}")]
    Decode(String),
}

impl SourceError {
    /// Whether retrying the same call could succeed.
    ///
    /// Not-found, forbidden and decode errors are permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::RateLimited { .. }
                | SourceError::Timeout(_)
                | SourceError::Network(_)
                | SourceError::Server { .. }
        )
    }

    /// The host's retry-after hint, if it gave one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            SourceError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Collapse into the per-file error kind recorded in a `FetchResult`.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            SourceError::NotFound(_) => FetchErrorKind::NotFound,
            SourceError::Forbidden(_) => FetchErrorKind::Forbidden,
            SourceError::RateLimited { .. } => FetchErrorKind::RateLimited,
            SourceError::Timeout(_) => FetchErrorKind::NetworkTimeout,
            SourceError::Network(_) => FetchErrorKind::Network,
            SourceError::Server { .. } => FetchErrorKind::Server,
            SourceError::Decode(_) => FetchErrorKind::DecodeError,
        }
    }
}
