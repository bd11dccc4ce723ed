//! Collection pipeline.
//!
//! Runs the snapshot stages in order: org profile → member roster →
//! per-repo statistics → month-bucketed commit matrix → member-filtered
//! aggregation. Each stage takes the prior snapshot and returns a new one;
//! a checkpoint file is written after every stage so a crash mid-run
//! leaves the last fully-written, still-valid report behind.
//!
//! Failure isolation: an error while collecting a single repository is
//! logged and that repository contributes nothing; errors fetching the
//! profile, roster, or repo listing abort the run.

use crate::aggregate::{self, MonthWindow};
use crate::github::{GithubClient, GithubError};
use crate::models::{ContributorMap, MonthCounts, RepoStats, Report, SixMonthMatrix};
use crate::report::save_report;
use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Collector settings resolved from config and CLI.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Organization login.
    pub org: String,
    /// Report output path (also used for checkpoints).
    pub output: PathBuf,
    /// Bound on concurrent repository fetches.
    pub concurrency: usize,
    /// Number of trailing one-month windows.
    pub months: u32,
    /// Suppress the progress bar (quiet mode).
    pub quiet: bool,
}

/// Orchestrates the collection stages against a [`GithubClient`].
pub struct Collector {
    client: GithubClient,
    options: CollectOptions,
}

impl Collector {
    pub fn new(client: GithubClient, options: CollectOptions) -> Self {
        Self { client, options }
    }

    /// Run every stage and return the final, member-filtered report.
    pub async fn run(&self) -> Result<Report> {
        let org = &self.options.org;

        info!("Fetching organization profile for {org}");
        let org_info = self
            .client
            .org_info(org)
            .await
            .with_context(|| format!("Failed to fetch profile for organization '{org}'"))?;
        let report = Report::new(org_info);
        self.checkpoint(&report)?;

        info!("Fetching member roster");
        let members = self
            .client
            .org_members(org)
            .await
            .context("Failed to fetch the member roster")?;
        info!("Roster has {} members", members.len());
        let report = Report { members, ..report };
        self.checkpoint(&report)?;

        info!("Listing repositories");
        let names = self
            .client
            .org_repos(org)
            .await
            .context("Failed to list organization repositories")?;
        info!("Found {} repositories", names.len());

        let repos = self.collect_repos(&names).await;
        let report = Report { repos, ..report };
        self.checkpoint(&report)?;

        let by_six_month = self.collect_month_matrix(&names, Utc::now()).await;
        let report = Report {
            by_six_month,
            ..report
        };
        self.checkpoint(&report)?;

        info!("Aggregating member-filtered totals");
        let report = aggregate::filter_report(report);
        self.checkpoint(&report)?;

        Ok(report)
    }

    /// Fetch per-repo statistics with a bounded fan-out. `buffered` keeps
    /// API listing order in the output map.
    async fn collect_repos(&self, names: &[String]) -> IndexMap<String, RepoStats> {
        let bar = self.progress_bar(names.len() as u64, "collecting repositories");

        let results: Vec<(String, Result<RepoStats, GithubError>)> =
            stream::iter(names.iter().cloned())
                .map(|name| {
                    let client = self.client.clone();
                    let org = self.options.org.clone();
                    let bar = bar.clone();
                    async move {
                        let stats = collect_repo(&client, &org, &name).await;
                        bar.inc(1);
                        (name, stats)
                    }
                })
                .buffered(self.options.concurrency.max(1))
                .collect()
                .await;
        bar.finish_and_clear();

        let mut repos = IndexMap::new();
        for (name, result) in results {
            match result {
                Ok(stats) => {
                    repos.insert(name, stats);
                }
                Err(e) => {
                    warn!("Skipping repository {name}: {e}");
                }
            }
        }
        repos
    }

    /// Build the raw (unfiltered) month matrix, most recent window first.
    async fn collect_month_matrix(&self, names: &[String], now: chrono::DateTime<Utc>) -> SixMonthMatrix {
        let windows = aggregate::month_windows(now, self.options.months);
        let mut matrix = SixMonthMatrix::new();

        for window in &windows {
            info!("Counting commits for {}", window.label);
            let counts = self.collect_window(names, window).await;
            matrix.insert(window.label.clone(), counts);
        }
        matrix
    }

    /// Count commits per author across all repos in one window.
    async fn collect_window(&self, names: &[String], window: &MonthWindow) -> MonthCounts {
        let results: Vec<(String, Result<Vec<crate::github::CommitEntry>, GithubError>)> =
            stream::iter(names.iter().cloned())
                .map(|name| {
                    let client = self.client.clone();
                    let org = self.options.org.clone();
                    let (since, until) = (window.since, window.until);
                    async move {
                        let commits = client.repo_commits_between(&org, &name, since, until).await;
                        (name, commits)
                    }
                })
                .buffered(self.options.concurrency.max(1))
                .collect()
                .await;

        let mut counts = MonthCounts::new();
        for (name, result) in results {
            let commits = match result {
                Ok(commits) => commits,
                Err(e) => {
                    // 409 here usually means an empty repository.
                    warn!("Skipping commits for {name} in {}: {e}", window.label);
                    continue;
                }
            };

            for commit in &commits {
                match commit.author_key() {
                    Some(key) => {
                        if commit.author.is_none() {
                            debug!("no GitHub login for a commit in {name}, bucketing as '{key}'");
                        }
                        *counts.entry(key.to_string()).or_insert(0) += 1;
                    }
                    None => debug!("unattributable commit in {name}, dropped"),
                }
            }
        }
        counts
    }

    fn checkpoint(&self, report: &Report) -> Result<()> {
        save_report(&self.options.output, report)?;
        debug!("Checkpoint written to {}", self.options.output.display());
        Ok(())
    }

    fn progress_bar(&self, len: u64, msg: &'static str) -> ProgressBar {
        if self.options.quiet {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        bar.set_message(msg);
        bar
    }
}

/// Fetch everything the report needs for one repository.
///
/// A malformed contributors payload is downgraded to an empty map (the
/// aggregation filter then excludes the repo); any other error fails the
/// repo as a whole and the caller skips it.
async fn collect_repo(
    client: &GithubClient,
    org: &str,
    name: &str,
) -> Result<RepoStats, GithubError> {
    let member_commits = match client.repo_contributors(org, name).await {
        Ok(map) => map,
        Err(e) if e.is_unexpected_shape() => {
            warn!("Unexpected contributors payload for {name}, treating as empty: {e}");
            ContributorMap::new()
        }
        Err(e) => return Err(e),
    };

    let languages = client.repo_languages(org, name).await?;
    let stars = client.repo_stars(org, name).await?;
    let (pull_requests, merged_pull_requests) = client.repo_pull_counts(org, name).await?;

    let mut stats = RepoStats {
        contributions: 0,
        languages,
        member_commits,
        stars,
        pull_requests,
        merged_pull_requests,
    };
    stats.recompute_contributions();
    Ok(stats)
}
