//! Documentation discovery and retrieval.
//!
//! - [`RepositoryTreeReader`] lists documentation files of a repository
//! - [`classifier`] ranks them into relevance tiers
//! - [`ContentFetcher`] fetches content with bounded concurrency and retries
//! - [`RetrievalOrchestrator`] runs the whole pipeline

pub mod cancel;
pub mod classifier;
pub mod fetcher;
pub mod orchestrator;
pub mod tree;

pub use cancel::CancelToken;
pub use classifier::{SelectionPolicy, classify, select};
pub use fetcher::{ContentFetcher, DEFAULT_CONCURRENCY, RetryPolicy};
pub use orchestrator::{DocumentListing, RetrievalOrchestrator};
pub use tree::{ExclusionRules, RepositoryTreeReader};
