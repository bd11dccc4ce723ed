//! Error types for the GitHub client seam.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by [`crate::github::GithubClient`].
///
/// Callers distinguish hard HTTP failures (fatal for the call, caught at
/// per-repository granularity) from unexpected response shapes (logged
/// and treated as empty data).
#[derive(Debug, Error)]
pub enum GithubError {
    /// The API returned a non-2xx status after retries were exhausted.
    #[error("GitHub API returned HTTP {status} for {url}")]
    Status { status: StatusCode, url: String },

    /// The request never produced a response (DNS, TLS, timeout).
    #[error("network error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response parsed as JSON but did not have the expected shape,
    /// e.g. contributors that are not an array.
    #[error("unexpected response shape from {url}: {detail}")]
    UnexpectedShape { url: String, detail: String },
}

impl GithubError {
    /// True when the response shape was wrong but the call itself succeeded.
    pub fn is_unexpected_shape(&self) -> bool {
        matches!(self, GithubError::UnexpectedShape { .. })
    }
}
