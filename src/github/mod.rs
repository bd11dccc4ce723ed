//! GitHub REST API client.
//!
//! This module provides the typed client used by the collector, including
//! the shared pagination helper and the retry/backoff policy.

pub mod client;
pub mod error;

pub use client::{CommitEntry, GithubClient, GithubClientOptions};
pub use error::GithubError;
