//! Member-filtered aggregation.
//!
//! This is the heart of the tool: reconciling raw per-repo contributor
//! data against the organization's member roster. A repository is retained
//! iff its contributor map intersects the roster; retained repos get their
//! contributor maps restricted to members and all totals roll up from
//! retained repos only. The six-month matrix is likewise restricted to the
//! roster, with a synthetic `total` per month and a `summary` entry across
//! all months.
//!
//! Every function here is a pure snapshot-in/snapshot-out stage; nothing
//! mutates shared state.

use crate::models::{
    ContributorMap, LanguageBreakdown, MonthCounts, RepoStats, Report, SixMonthMatrix,
};
use chrono::{DateTime, Datelike, Months, Utc};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Synthetic per-month key holding the sum of member counts.
pub const TOTAL_KEY: &str = "total";

/// Synthetic matrix entry aggregating every member across all months.
pub const SUMMARY_KEY: &str = "summary";

/// Totals rolled up from the repositories that survived the member filter.
#[derive(Debug, Clone, Default)]
pub struct FilteredTotals {
    /// Retained repos, contributor maps restricted to the roster.
    pub repos: IndexMap<String, RepoStats>,
    pub total_stars: u64,
    pub total_prs: u64,
    pub total_merged_prs: u64,
    pub total_contributions: u64,
    pub total_languages: LanguageBreakdown,
    pub total_member_commits: ContributorMap,
}

/// One month-long collection window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    /// Inclusive start.
    pub since: DateTime<Utc>,
    /// Exclusive end.
    pub until: DateTime<Utc>,
    /// Human label derived from the window end, e.g. `"4/2024"`.
    pub label: String,
}

/// Build `months` one-month windows ending at `now`, most recent first.
///
/// Window *i* spans `now − (i+1) months` to `now − i months`; timestamp
/// comparison is delegated to the API's `since`/`until` filtering.
pub fn month_windows(now: DateTime<Utc>, months: u32) -> Vec<MonthWindow> {
    (0..months)
        .filter_map(|i| {
            let since = now.checked_sub_months(Months::new(i + 1))?;
            let until = now.checked_sub_months(Months::new(i))?;
            Some(MonthWindow {
                since,
                until,
                label: format!("{}/{}", until.month(), until.year()),
            })
        })
        .collect()
}

/// True iff the repo has at least one contributor in the roster.
pub fn has_member_contributor(repo: &RepoStats, roster: &HashSet<&str>) -> bool {
    repo.member_commits
        .keys()
        .any(|login| roster.contains(login.as_str()))
}

/// Restrict repositories to those with at least one contributing member
/// and roll up totals from the retained repos only.
///
/// Retained repos keep their language breakdown but have their contributor
/// map restricted to roster members and `contributions` recomputed from the
/// restricted map. `total_member_commits` carries every roster member,
/// zero-seeded, so members without commits still appear.
pub fn filter_by_members(
    repos: &IndexMap<String, RepoStats>,
    members: &[String],
) -> FilteredTotals {
    let roster: HashSet<&str> = members.iter().map(String::as_str).collect();

    let mut totals = FilteredTotals::default();
    for member in members {
        totals.total_member_commits.insert(member.clone(), 0);
    }

    for (name, repo) in repos {
        if !has_member_contributor(repo, &roster) {
            // Excluded entirely: no stars, no PRs, no language bytes.
            continue;
        }

        let mut filtered = ContributorMap::new();
        for member in members {
            if let Some(&count) = repo.member_commits.get(member) {
                filtered.insert(member.clone(), count);
                *totals
                    .total_member_commits
                    .entry(member.clone())
                    .or_insert(0) += count;
            }
        }

        let contributions: u64 = filtered.values().sum();

        totals.total_stars += repo.stars;
        totals.total_prs += repo.pull_requests;
        totals.total_merged_prs += repo.merged_pull_requests;
        totals.total_contributions += contributions;
        for (language, bytes) in &repo.languages {
            *totals.total_languages.entry(language.clone()).or_insert(0) += bytes;
        }

        totals.repos.insert(
            name.clone(),
            RepoStats {
                contributions,
                languages: repo.languages.clone(),
                member_commits: filtered,
                stars: repo.stars,
                pull_requests: repo.pull_requests,
                merged_pull_requests: repo.merged_pull_requests,
            },
        );
    }

    totals
}

/// Restrict the month matrix to roster members.
///
/// Every month keeps an entry for every member (zero-filled when absent)
/// plus a [`TOTAL_KEY`] sum. A [`SUMMARY_KEY`] entry is appended with each
/// member's cross-month sum and the grand total. Non-member attribution
/// keys (raw commit author names, bots) are silently dropped. A previous
/// `summary` entry in the input is ignored, so re-filtering an already
/// filtered matrix is a fixed point.
pub fn filter_six_month(matrix: &SixMonthMatrix, members: &[String]) -> SixMonthMatrix {
    let mut filtered = SixMonthMatrix::new();

    let mut summary = MonthCounts::new();
    for member in members {
        summary.insert(member.clone(), 0);
    }
    summary.insert(TOTAL_KEY.to_string(), 0);

    for (month, counts) in matrix {
        if month == SUMMARY_KEY {
            continue;
        }

        let mut month_out = MonthCounts::new();
        let mut month_total = 0u64;
        for member in members {
            let count = counts.get(member).copied().unwrap_or(0);
            month_out.insert(member.clone(), count);
            month_total += count;
            *summary.entry(member.clone()).or_insert(0) += count;
        }
        month_out.insert(TOTAL_KEY.to_string(), month_total);
        *summary.entry(TOTAL_KEY.to_string()).or_insert(0) += month_total;

        filtered.insert(month.clone(), month_out);
    }

    filtered.insert(SUMMARY_KEY.to_string(), summary);
    filtered
}

/// Aggregation stage: take the raw collected snapshot and return the
/// member-filtered report with all totals recomputed.
pub fn filter_report(report: Report) -> Report {
    let totals = filter_by_members(&report.repos, &report.members);
    let by_six_month = filter_six_month(&report.by_six_month, &report.members);

    Report {
        repos: totals.repos,
        total_stars: totals.total_stars,
        total_prs: totals.total_prs,
        total_merged_prs: totals.total_merged_prs,
        total_contributions: totals.total_contributions,
        total_languages: totals.total_languages,
        total_member_commits: totals.total_member_commits,
        by_six_month,
        ..report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo(contributors: &[(&str, u64)], languages: &[(&str, u64)], stars: u64) -> RepoStats {
        RepoStats {
            contributions: contributors.iter().map(|(_, n)| n).sum(),
            languages: languages
                .iter()
                .map(|(l, n)| (l.to_string(), *n))
                .collect(),
            member_commits: contributors
                .iter()
                .map(|(c, n)| (c.to_string(), *n))
                .collect(),
            stars,
            pull_requests: 1,
            merged_pull_requests: 1,
        }
    }

    fn members(logins: &[&str]) -> Vec<String> {
        logins.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_repo_retained_iff_roster_intersects() {
        let mut repos = IndexMap::new();
        repos.insert("x".to_string(), repo(&[("alice", 5), ("carol", 3)], &[], 0));
        repos.insert("y".to_string(), repo(&[("carol", 9)], &[], 0));

        let totals = filter_by_members(&repos, &members(&["alice", "bob"]));

        assert!(totals.repos.contains_key("x"));
        assert!(!totals.repos.contains_key("y"));
    }

    #[test]
    fn test_filtered_repo_example() {
        // members = {alice, bob}; repo x has {alice:5, carol:3}.
        let mut repos = IndexMap::new();
        repos.insert("x".to_string(), repo(&[("alice", 5), ("carol", 3)], &[], 0));

        let totals = filter_by_members(&repos, &members(&["alice", "bob"]));

        let x = &totals.repos["x"];
        assert_eq!(x.member_commits.len(), 1);
        assert_eq!(x.member_commits["alice"], 5);
        assert_eq!(x.contributions, 5);
        assert_eq!(totals.total_contributions, 5);
        assert_eq!(totals.total_member_commits["alice"], 5);
        assert_eq!(totals.total_member_commits["bob"], 0);
    }

    #[test]
    fn test_excluded_repo_contributes_no_language_bytes() {
        let mut repos = IndexMap::new();
        repos.insert(
            "kept".to_string(),
            repo(&[("alice", 1)], &[("Rust", 100)], 2),
        );
        repos.insert(
            "dropped".to_string(),
            repo(&[("carol", 9)], &[("Rust", 5000), ("Go", 700)], 50),
        );

        let totals = filter_by_members(&repos, &members(&["alice"]));

        assert_eq!(totals.total_languages["Rust"], 100);
        assert!(totals.total_languages.get("Go").is_none());
        assert_eq!(totals.total_stars, 2);
    }

    #[test]
    fn test_language_bytes_sum_across_retained_repos() {
        let mut repos = IndexMap::new();
        repos.insert("a".to_string(), repo(&[("alice", 1)], &[("Rust", 100)], 0));
        repos.insert("b".to_string(), repo(&[("alice", 2)], &[("Rust", 250)], 0));

        let totals = filter_by_members(&repos, &members(&["alice"]));
        assert_eq!(totals.total_languages["Rust"], 350);
    }

    #[test]
    fn test_total_member_commits_additivity() {
        let mut repos = IndexMap::new();
        repos.insert("a".to_string(), repo(&[("alice", 3), ("bob", 1)], &[], 0));
        repos.insert("b".to_string(), repo(&[("alice", 4)], &[], 0));

        let roster = members(&["alice", "bob"]);
        let totals = filter_by_members(&repos, &roster);

        for member in &roster {
            let expected: u64 = totals
                .repos
                .values()
                .filter_map(|r| r.member_commits.get(member))
                .sum();
            assert_eq!(totals.total_member_commits[member], expected);
        }
        assert_eq!(totals.total_member_commits["alice"], 7);
        assert_eq!(totals.total_member_commits["bob"], 1);
    }

    #[test]
    fn test_empty_contributor_map_fails_predicate() {
        let mut repos = IndexMap::new();
        repos.insert("empty".to_string(), repo(&[], &[("Rust", 100)], 10));

        let totals = filter_by_members(&repos, &members(&["alice"]));
        assert!(totals.repos.is_empty());
        assert_eq!(totals.total_stars, 0);
        assert!(totals.total_languages.is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut report = Report::default();
        report.members = members(&["alice", "bob"]);
        report
            .repos
            .insert("x".to_string(), repo(&[("alice", 5), ("carol", 3)], &[("Rust", 10)], 2));
        report.by_six_month.insert(
            "4/2024".to_string(),
            MonthCounts::from([("alice".to_string(), 2), ("carol".to_string(), 7)]),
        );

        let once = filter_report(report);
        let twice = filter_report(once.clone());

        assert_eq!(once.repos, twice.repos);
        assert_eq!(once.total_stars, twice.total_stars);
        assert_eq!(once.total_contributions, twice.total_contributions);
        assert_eq!(once.total_languages, twice.total_languages);
        assert_eq!(once.total_member_commits, twice.total_member_commits);
        assert_eq!(once.by_six_month, twice.by_six_month);
    }

    #[test]
    fn test_six_month_summary_example() {
        // "6/2024" = {alice:2, bob:1}, "5/2024" = {alice:3}
        let mut matrix = SixMonthMatrix::new();
        matrix.insert(
            "6/2024".to_string(),
            MonthCounts::from([("alice".to_string(), 2), ("bob".to_string(), 1)]),
        );
        matrix.insert(
            "5/2024".to_string(),
            MonthCounts::from([("alice".to_string(), 3)]),
        );

        let filtered = filter_six_month(&matrix, &members(&["alice", "bob"]));

        let summary = &filtered[SUMMARY_KEY];
        assert_eq!(summary["alice"], 5);
        assert_eq!(summary["bob"], 1);
        assert_eq!(summary[TOTAL_KEY], 6);
    }

    #[test]
    fn test_six_month_per_month_totals_and_zero_fill() {
        let mut matrix = SixMonthMatrix::new();
        matrix.insert(
            "6/2024".to_string(),
            MonthCounts::from([
                ("alice".to_string(), 2),
                ("carol".to_string(), 50), // not in roster, dropped
            ]),
        );

        let filtered = filter_six_month(&matrix, &members(&["alice", "bob"]));

        let month = &filtered["6/2024"];
        assert_eq!(month["alice"], 2);
        assert_eq!(month["bob"], 0);
        assert_eq!(month[TOTAL_KEY], 2);
        assert!(month.get("carol").is_none());
    }

    #[test]
    fn test_six_month_summary_total_equals_sum_of_month_totals() {
        let mut matrix = SixMonthMatrix::new();
        for (label, n) in [("6/2024", 4u64), ("5/2024", 2), ("4/2024", 9)] {
            matrix.insert(
                label.to_string(),
                MonthCounts::from([("alice".to_string(), n)]),
            );
        }

        let filtered = filter_six_month(&matrix, &members(&["alice"]));

        let month_sum: u64 = filtered
            .iter()
            .filter(|(label, _)| label.as_str() != SUMMARY_KEY)
            .map(|(_, counts)| counts[TOTAL_KEY])
            .sum();
        assert_eq!(filtered[SUMMARY_KEY][TOTAL_KEY], month_sum);
        assert_eq!(filtered[SUMMARY_KEY][TOTAL_KEY], 15);
    }

    #[test]
    fn test_six_month_refilter_ignores_previous_summary() {
        let mut matrix = SixMonthMatrix::new();
        matrix.insert(
            "6/2024".to_string(),
            MonthCounts::from([("alice".to_string(), 2)]),
        );

        let once = filter_six_month(&matrix, &members(&["alice"]));
        let twice = filter_six_month(&once, &members(&["alice"]));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_month_windows_boundaries_and_labels() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let windows = month_windows(now, 6);

        assert_eq!(windows.len(), 6);
        // Most recent window first.
        assert_eq!(windows[0].label, "6/2024");
        assert_eq!(
            windows[0].since,
            Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
        );
        assert_eq!(windows[0].until, now);
        // Oldest window crosses the year boundary.
        assert_eq!(windows[5].label, "1/2024");
        assert_eq!(
            windows[5].since,
            Utc.with_ymd_and_hms(2023, 12, 15, 12, 0, 0).unwrap()
        );

        // Windows tile: each window ends where the next-more-recent starts.
        for pair in windows.windows(2) {
            assert_eq!(pair[1].until, pair[0].since);
        }
    }

    #[test]
    fn test_month_windows_clamp_short_months() {
        // May 31 minus one month clamps to April 30.
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap();
        let windows = month_windows(now, 1);
        assert_eq!(
            windows[0].since,
            Utc.with_ymd_and_hms(2024, 4, 30, 0, 0, 0).unwrap()
        );
        assert_eq!(windows[0].label, "5/2024");
    }
}
