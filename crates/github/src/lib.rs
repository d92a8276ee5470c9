//! GitHub implementation of the ghdocs repository source.
//!
//! `GitHubClient` implements `ghdocs_core::RepositorySource` on top of the
//! REST API (metadata, recursive trees) and the raw content host.

pub mod client;

pub use client::GitHubClient;
