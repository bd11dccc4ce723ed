//! Data models for the organization statistics report.
//!
//! This module contains the core data structures shared by the collector,
//! the aggregator, and the renderer. Serialized field names match the
//! report file consumed by downstream tooling (camelCase totals,
//! `by6month` matrix), so renaming anything here is a breaking change.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Language name → byte count for one repository.
pub type LanguageBreakdown = IndexMap<String, u64>;

/// Contributor login → contribution count. Includes non-members until
/// the aggregator restricts it to the roster.
pub type ContributorMap = IndexMap<String, u64>;

/// Member login → commit count for one month. May carry the synthetic
/// `total` entry after filtering.
pub type MonthCounts = IndexMap<String, u64>;

/// Month label (e.g. `"4/2024"`) → per-member counts. Insertion order is
/// collection order (most recent window first); the renderer reverses it
/// for chronological display.
pub type SixMonthMatrix = IndexMap<String, MonthCounts>;

/// Organization profile, the subset of `GET /orgs/{org}` kept in the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgInfo {
    pub login: String,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub org_type: Option<String>,
    pub company: Option<String>,
    pub name: Option<String>,
    pub twitter_username: Option<String>,
}

/// Per-repository snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    /// Sum of the contribution counts in `member_commits`. After filtering
    /// this covers roster members only.
    pub contributions: u64,
    /// Language byte counts as reported by the languages endpoint.
    pub languages: LanguageBreakdown,
    /// Contributor login → contribution count.
    pub member_commits: ContributorMap,
    pub stars: u64,
    pub pull_requests: u64,
    pub merged_pull_requests: u64,
}

impl RepoStats {
    /// Recompute `contributions` from the current contributor map.
    pub fn recompute_contributions(&mut self) {
        self.contributions = self.member_commits.values().sum();
    }
}

/// The complete aggregate report: one JSON file per run, superseded
/// wholesale on the next run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Organization profile.
    pub info: OrgInfo,
    /// Current member roster (logins, unique).
    #[serde(default)]
    pub members: Vec<String>,
    /// Repo name → snapshot, in API listing order.
    #[serde(default)]
    pub repos: IndexMap<String, RepoStats>,
    #[serde(rename = "totalStars", default)]
    pub total_stars: u64,
    #[serde(rename = "totalPRs", default)]
    pub total_prs: u64,
    #[serde(rename = "totalMergedPRs", default)]
    pub total_merged_prs: u64,
    #[serde(rename = "totalContributions", default)]
    pub total_contributions: u64,
    /// Merged language byte counts across retained repos.
    #[serde(rename = "totalLanguages", default)]
    pub total_languages: LanguageBreakdown,
    /// Member login → summed contributions, roster members only.
    #[serde(rename = "totalMemberCommits", default)]
    pub total_member_commits: ContributorMap,
    /// Rolling month-bucketed contribution matrix.
    #[serde(rename = "by6month", default)]
    pub by_six_month: SixMonthMatrix,
}

impl Report {
    /// Creates an empty report for the given organization profile.
    pub fn new(info: OrgInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }
}
