//! Typed GitHub REST client.
//!
//! All list endpoints go through one pagination helper: page size from
//! config, pages starting at 1, stop on the first empty page, merge by
//! concatenation. Rate-limited (429) and 5xx responses are retried with
//! backoff; any other non-2xx status is a hard failure for the call.

use crate::github::error::GithubError;
use crate::models::{ContributorMap, LanguageBreakdown, OrgInfo};
use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("orgstats/", env!("CARGO_PKG_VERSION"));

/// Construction options for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubClientOptions {
    /// API base URL, no trailing slash.
    pub api_url: String,
    /// Bearer token; unauthenticated requests work but are tightly rate-limited.
    pub token: Option<String>,
    /// Page size for paginated list endpoints.
    pub per_page: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum attempts for rate-limited or 5xx responses.
    pub retries: usize,
}

impl Default for GithubClientOptions {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            per_page: 100,
            timeout: Duration::from_secs(30),
            retries: 4,
        }
    }
}

/// GitHub REST API client.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    options: GithubClientOptions,
}

/// One member entry from the org members endpoint.
#[derive(Debug, Deserialize)]
struct MemberEntry {
    login: String,
}

/// One repository entry from the org repos endpoint.
#[derive(Debug, Deserialize)]
struct RepoEntry {
    name: String,
}

/// One contributor entry from the repo contributors endpoint.
#[derive(Debug, Deserialize)]
struct ContributorEntry {
    login: String,
    #[serde(default)]
    contributions: u64,
}

/// Repository detail payload; only the star count is used.
#[derive(Debug, Deserialize)]
struct RepoDetails {
    #[serde(default)]
    stargazers_count: u64,
}

/// One pull request entry; only the merge marker is used.
#[derive(Debug, Deserialize)]
struct PullEntry {
    merged_at: Option<DateTime<Utc>>,
}

/// One commit from the repo commits endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitEntry {
    /// GitHub user the commit is linked to, when the author is resolvable.
    pub author: Option<CommitAuthor>,
    /// Raw git metadata.
    pub commit: Option<CommitMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitMeta {
    pub author: Option<GitSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitSignature {
    pub name: Option<String>,
}

impl CommitEntry {
    /// Attribution key for this commit: the GitHub login when present,
    /// else the raw commit author name. `None` when neither exists.
    pub fn author_key(&self) -> Option<&str> {
        if let Some(login) = self.author.as_ref().and_then(|a| a.login.as_deref()) {
            return Some(login);
        }
        self.commit
            .as_ref()
            .and_then(|c| c.author.as_ref())
            .and_then(|a| a.name.as_deref())
    }
}

impl GithubClient {
    /// Create a client from the given options.
    pub fn new(options: GithubClientOptions) -> Result<Self, GithubError> {
        let http = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|source| GithubError::Transport {
                url: options.api_url.clone(),
                source,
            })?;

        Ok(Self { http, options })
    }

    /// Low-level GET with retry/backoff. Returns the parsed JSON body;
    /// an empty 2xx body (e.g. 204 from an empty repo) parses as `Null`.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, GithubError> {
        let url = format!("{}{}", self.options.api_url, path);
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let mut req = self
                .http
                .get(&url)
                .header("Accept", ACCEPT_HEADER)
                .header("User-Agent", USER_AGENT)
                .query(query);

            if let Some(ref token) = self.options.token {
                req = req.bearer_auth(token);
            }

            let resp = req.send().await.map_err(|source| GithubError::Transport {
                url: url.clone(),
                source,
            })?;

            let status = resp.status();
            let headers = resp.headers().clone();

            if status.is_success() {
                let text = resp.text().await.map_err(|source| GithubError::Transport {
                    url: url.clone(),
                    source,
                })?;
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return serde_json::from_str(&text).map_err(|e| GithubError::UnexpectedShape {
                    url: url.clone(),
                    detail: format!("invalid JSON body: {e}"),
                });
            }

            // Honor Retry-After on rate limits.
            if status.as_u16() == 429 && attempt < self.options.retries {
                let wait_secs = headers
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                debug!("rate limited on {url}, retrying in {wait_secs}s");
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            // Exponential backoff on server errors.
            if status.is_server_error() && attempt < self.options.retries {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                debug!("HTTP {status} on {url}, retrying in {backoff:?}");
                sleep(backoff).await;
                continue;
            }

            return Err(GithubError::Status {
                status,
                url: url.clone(),
            });
        }
    }

    /// Fetch every page of a list endpoint and merge by concatenation.
    /// Stops on the first empty page.
    async fn get_paged(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, GithubError> {
        let mut merged = Vec::new();

        for page in 1usize.. {
            let mut params = vec![
                ("per_page", self.options.per_page.to_string()),
                ("page", page.to_string()),
            ];
            params.extend(query.iter().map(|(k, v)| (*k, v.clone())));

            let json = self.get_json(path, &params).await?;
            let items = match json {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                other => {
                    return Err(GithubError::UnexpectedShape {
                        url: format!("{}{}", self.options.api_url, path),
                        detail: format!("expected array, got {other}"),
                    });
                }
            };

            if items.is_empty() {
                break;
            }
            merged.extend(items);
        }

        Ok(merged)
    }

    /// Organization profile.
    pub async fn org_info(&self, org: &str) -> Result<OrgInfo, GithubError> {
        let path = format!("/orgs/{org}");
        let json = self.get_json(&path, &[]).await?;
        serde_json::from_value(json).map_err(|e| GithubError::UnexpectedShape {
            url: format!("{}{}", self.options.api_url, path),
            detail: e.to_string(),
        })
    }

    /// Member roster: logins only, API listing order.
    pub async fn org_members(&self, org: &str) -> Result<Vec<String>, GithubError> {
        let items = self.get_paged(&format!("/orgs/{org}/members"), &[]).await?;
        Ok(decode_entries::<MemberEntry>(items)
            .map(|m| m.login)
            .collect())
    }

    /// Repository names, API listing order.
    pub async fn org_repos(&self, org: &str) -> Result<Vec<String>, GithubError> {
        let items = self.get_paged(&format!("/orgs/{org}/repos"), &[]).await?;
        Ok(decode_entries::<RepoEntry>(items).map(|r| r.name).collect())
    }

    /// Contributor login → contribution count for one repository.
    ///
    /// An empty body (uninitialized repo) yields an empty map; any other
    /// non-array body is an unexpected-shape error the collector downgrades
    /// to a warning.
    pub async fn repo_contributors(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<ContributorMap, GithubError> {
        let path = format!("/repos/{org}/{repo}/contributors");
        let json = self.get_json(&path, &[]).await?;

        let items = match json {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(GithubError::UnexpectedShape {
                    url: format!("{}{}", self.options.api_url, path),
                    detail: format!("contributors is not an array: {other}"),
                });
            }
        };

        let mut map = ContributorMap::new();
        for entry in decode_entries::<ContributorEntry>(items) {
            *map.entry(entry.login).or_insert(0) += entry.contributions;
        }
        Ok(map)
    }

    /// Language byte counts for one repository.
    pub async fn repo_languages(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<LanguageBreakdown, GithubError> {
        let path = format!("/repos/{org}/{repo}/languages");
        let json = self.get_json(&path, &[]).await?;

        match json {
            Value::Null => Ok(LanguageBreakdown::new()),
            other => serde_json::from_value(other).map_err(|e| GithubError::UnexpectedShape {
                url: format!("{}{}", self.options.api_url, path),
                detail: e.to_string(),
            }),
        }
    }

    /// Star count for one repository.
    pub async fn repo_stars(&self, org: &str, repo: &str) -> Result<u64, GithubError> {
        let path = format!("/repos/{org}/{repo}");
        let json = self.get_json(&path, &[]).await?;
        let details: RepoDetails =
            serde_json::from_value(json).map_err(|e| GithubError::UnexpectedShape {
                url: format!("{}{}", self.options.api_url, path),
                detail: e.to_string(),
            })?;
        Ok(details.stargazers_count)
    }

    /// Total and merged pull-request counts for one repository.
    pub async fn repo_pull_counts(&self, org: &str, repo: &str) -> Result<(u64, u64), GithubError> {
        let items = self
            .get_paged(
                &format!("/repos/{org}/{repo}/pulls"),
                &[("state", "all".to_string())],
            )
            .await?;

        let total = items.len() as u64;
        let merged = decode_entries::<PullEntry>(items)
            .filter(|p| p.merged_at.is_some())
            .count() as u64;
        Ok((total, merged))
    }

    /// Commits in a time window. `since`/`until` filtering is delegated to
    /// the API (inclusive-start/exclusive-end by ISO timestamp).
    pub async fn repo_commits_between(
        &self,
        org: &str,
        repo: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<CommitEntry>, GithubError> {
        let items = self
            .get_paged(
                &format!("/repos/{org}/{repo}/commits"),
                &[
                    ("since", since.to_rfc3339()),
                    ("until", until.to_rfc3339()),
                ],
            )
            .await?;

        Ok(decode_entries::<CommitEntry>(items).collect())
    }
}

/// Decode list items, skipping entries that don't match the expected shape
/// (e.g. anonymous contributors without a login).
fn decode_entries<T: serde::de::DeserializeOwned>(
    items: Vec<Value>,
) -> impl Iterator<Item = T> {
    items.into_iter().filter_map(|item| {
        match serde_json::from_value::<T>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping malformed list entry: {e}");
                None
            }
        }
    })
}
