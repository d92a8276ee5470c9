//! # ghdocs Core
//!
//! Domain types, traits, and error definitions for ghdocs, a tool that
//! discovers, ranks and fetches the documentation of a GitHub repository.
//! This crate has **no HTTP dependency**. It defines the domain model
//! that the other crates implement against.
//!
//! ## Design Philosophy
//!
//! The repository host is a trait here ([`RepositorySource`]); the GitHub
//! client lives in `ghdocs-github`. This enables:
//! - Running the pipeline against GitHub Enterprise or a mirror
//! - Easy testing with in-memory fake sources
//! - Clean dependency graph (all crates depend inward on core)

pub mod document;
pub mod error;
pub mod event;
pub mod fetch;
pub mod repository;
pub mod source;
pub mod summary;

// Re-export key types at crate root for ergonomics
pub use document::{CandidatePath, ClassifiedPath, DocExtension, RelevanceTier};
pub use error::{Error, Result, SourceError};
pub use event::{EventBus, PipelineStage, RetrievalEvent};
pub use fetch::{FetchErrorKind, FetchResult};
pub use repository::RepositoryRef;
pub use source::{EntryKind, RepositorySource, TreeEntry, TreeListing};
pub use summary::{RetrievalSummary, TierGroup};
