//! The six report charts.
//!
//! Chart set and palette follow the original dashboard: a language pie,
//! three bar charts, a line of monthly org totals, and a stacked bar of
//! per-member monthly commits. Member series never include the synthetic
//! `total`/`summary` keys. Empty data renders an empty chart frame.

use crate::aggregate::{SUMMARY_KEY, TOTAL_KEY};
use crate::models::{MonthCounts, Report};
use crate::render::svg::{pie_slice_path, series_color, SvgCanvas};
use anyhow::{Context, Result};
use std::f64::consts::PI;
use std::path::PathBuf;
use tracing::info;

const BG: &str = "#ffffff";
const TEXT: &str = "#24292f";
const MUTED: &str = "#6a737d";

const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const LEGEND_WIDTH: f64 = 140.0;
const LEGEND_ROW: f64 = 16.0;
const MAX_LEGEND_ROWS: usize = 12;

/// Renderer settings resolved from config and CLI.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Render every chart into `out_dir` and return the written paths.
pub fn render_all(report: &Report, options: &RenderOptions) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&options.out_dir).with_context(|| {
        format!(
            "Failed to create chart directory {}",
            options.out_dir.display()
        )
    })?;

    let charts = [
        ("total_languages.svg", languages_pie(report, options)),
        (
            "total_member_commits.svg",
            member_commits_bar(report, options),
        ),
        (
            "six_month_summary.svg",
            six_month_summary_bar(report, options),
        ),
        ("six_month_totals.svg", six_month_totals_line(report, options)),
        (
            "monthly_member_commits.svg",
            monthly_member_stacked(report, options),
        ),
        ("org_totals.svg", org_totals_bar(report, options)),
    ];

    let mut written = Vec::new();
    for (name, svg) in charts {
        let path = options.out_dir.join(name);
        std::fs::write(&path, svg)
            .with_context(|| format!("Failed to write chart {}", path.display()))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Member entries of a month map, synthetic keys stripped.
fn member_series(counts: &MonthCounts) -> Vec<(&str, u64)> {
    counts
        .iter()
        .filter(|(key, _)| key.as_str() != TOTAL_KEY && key.as_str() != SUMMARY_KEY)
        .map(|(key, value)| (key.as_str(), *value))
        .collect()
}

/// Month labels oldest → newest. Collection order is newest-first, so
/// display order is the reverse.
fn chronological_months(report: &Report) -> Vec<&str> {
    let mut months: Vec<&str> = report
        .by_six_month
        .keys()
        .map(String::as_str)
        .filter(|key| *key != SUMMARY_KEY)
        .collect();
    months.reverse();
    months
}

/// Sum of member counts for one month; uses the synthetic total when the
/// matrix has already been filtered.
fn month_total(counts: &MonthCounts) -> u64 {
    counts
        .get(TOTAL_KEY)
        .copied()
        .unwrap_or_else(|| member_series(counts).iter().map(|(_, v)| v).sum())
}

fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let prefix: String = label.chars().take(max.saturating_sub(2)).collect();
        format!("{prefix}..")
    }
}

/// Shared vertical bar chart scaffold.
fn bar_chart(
    title: &str,
    data: &[(&str, u64)],
    width: u32,
    height: u32,
    color: impl Fn(usize) -> &'static str,
) -> String {
    let mut canvas = SvgCanvas::new(width, height, BG);
    canvas.text(width as f64 / 2.0, 22.0, 14, "middle", TEXT, title);

    let plot_w = width as f64 - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height as f64 - MARGIN_TOP - MARGIN_BOTTOM;
    let base_y = MARGIN_TOP + plot_h;

    canvas.line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, base_y, MUTED);
    canvas.line(MARGIN_LEFT, base_y, MARGIN_LEFT + plot_w, base_y, MUTED);

    if data.is_empty() {
        return canvas.finish();
    }

    let max = data.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1) as f64;
    let slot = plot_w / data.len() as f64;
    let bar_w = (slot * 0.7).min(60.0);

    for (i, (label, value)) in data.iter().enumerate() {
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
        let bar_h = (*value as f64 / max) * plot_h;
        let y = base_y - bar_h;

        canvas.rect(x, y, bar_w, bar_h, color(i));
        canvas.text(
            x + bar_w / 2.0,
            y - 4.0,
            10,
            "middle",
            TEXT,
            &value.to_string(),
        );
        canvas.text(
            x + bar_w / 2.0,
            base_y + 14.0,
            10,
            "middle",
            MUTED,
            &truncate_label(label, 12),
        );
    }

    canvas.finish()
}

fn legend(canvas: &mut SvgCanvas, x: f64, entries: &[(&str, &'static str)]) {
    for (i, (label, color)) in entries.iter().take(MAX_LEGEND_ROWS).enumerate() {
        let y = MARGIN_TOP + i as f64 * LEGEND_ROW;
        canvas.rect(x, y, 10.0, 10.0, color);
        canvas.text(x + 16.0, y + 9.0, 10, "start", TEXT, &truncate_label(label, 16));
    }
}

/// Pie of merged language byte counts, with percentage labels.
pub fn languages_pie(report: &Report, options: &RenderOptions) -> String {
    let (width, height) = (options.width, options.height);
    let mut canvas = SvgCanvas::new(width, height, BG);
    canvas.text(width as f64 / 2.0, 22.0, 14, "middle", TEXT, "Total Languages");

    let total: u64 = report.total_languages.values().sum();
    if total == 0 {
        return canvas.finish();
    }

    let cx = (width as f64 - LEGEND_WIDTH) / 2.0;
    let cy = (height as f64 + MARGIN_TOP) / 2.0;
    let r = (cx - 20.0).min((height as f64 - MARGIN_TOP) / 2.0 - 20.0);

    let mut start = -PI / 2.0;
    let mut legend_entries = Vec::new();

    for (i, (language, bytes)) in report.total_languages.iter().enumerate() {
        let fraction = *bytes as f64 / total as f64;
        let fill = series_color(i);
        legend_entries.push((language.as_str(), fill));

        if fraction <= 0.0 {
            continue;
        }
        let end = start + fraction * 2.0 * PI;
        if fraction >= 0.999 {
            canvas.circle(cx, cy, r, fill);
        } else {
            canvas.path(&pie_slice_path(cx, cy, r, start, end), fill);
        }

        // Percentage labels clutter tiny slices.
        if fraction >= 0.04 {
            let mid = (start + end) / 2.0;
            let (lx, ly) = (cx + 0.65 * r * mid.cos(), cy + 0.65 * r * mid.sin());
            canvas.text(
                lx,
                ly,
                11,
                "middle",
                "#ffffff",
                &format!("{:.2}%", fraction * 100.0),
            );
        }
        start = end;
    }

    legend(&mut canvas, width as f64 - LEGEND_WIDTH, &legend_entries);
    canvas.finish()
}

/// Bar of total commits per member across all retained repos.
pub fn member_commits_bar(report: &Report, options: &RenderOptions) -> String {
    let data = member_series(&report.total_member_commits);
    bar_chart(
        "Total Commits By Members",
        &data,
        options.width,
        options.height,
        |_| "#B2B200",
    )
}

/// Bar of each member's six-month commit total (the matrix summary row).
pub fn six_month_summary_bar(report: &Report, options: &RenderOptions) -> String {
    let data = report
        .by_six_month
        .get(SUMMARY_KEY)
        .map(member_series)
        .unwrap_or_default();
    bar_chart(
        "Commits By Members (Last 6 Months)",
        &data,
        options.width,
        options.height,
        |_| "#0073A5",
    )
}

/// Line of per-month org-wide commit totals, chronological.
pub fn six_month_totals_line(report: &Report, options: &RenderOptions) -> String {
    let (width, height) = (options.width, options.height);
    let mut canvas = SvgCanvas::new(width, height, BG);
    canvas.text(
        width as f64 / 2.0,
        22.0,
        14,
        "middle",
        TEXT,
        "Organization Commits By Month",
    );

    let plot_w = width as f64 - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height as f64 - MARGIN_TOP - MARGIN_BOTTOM;
    let base_y = MARGIN_TOP + plot_h;

    canvas.line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, base_y, MUTED);
    canvas.line(MARGIN_LEFT, base_y, MARGIN_LEFT + plot_w, base_y, MUTED);

    let months = chronological_months(report);
    if months.is_empty() {
        return canvas.finish();
    }

    let totals: Vec<u64> = months
        .iter()
        .map(|month| month_total(&report.by_six_month[*month]))
        .collect();
    let max = totals.iter().copied().max().unwrap_or(0).max(1) as f64;
    let step = if months.len() > 1 {
        plot_w / (months.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<(f64, f64)> = totals
        .iter()
        .enumerate()
        .map(|(i, total)| {
            let x = if months.len() > 1 {
                MARGIN_LEFT + step * i as f64
            } else {
                MARGIN_LEFT + plot_w / 2.0
            };
            let y = base_y - (*total as f64 / max) * plot_h;
            (x, y)
        })
        .collect();

    canvas.polyline(&points, "#0073A5");
    for (i, &(x, y)) in points.iter().enumerate() {
        canvas.circle(x, y, 3.0, "#0073A5");
        canvas.text(x, y - 8.0, 10, "middle", TEXT, &totals[i].to_string());
        canvas.text(x, base_y + 14.0, 10, "middle", MUTED, months[i]);
    }

    canvas.finish()
}

/// Stacked bar of per-member commits per month, chronological, with a
/// member legend. Stack order follows the roster.
pub fn monthly_member_stacked(report: &Report, options: &RenderOptions) -> String {
    let (width, height) = (options.width, options.height);
    let mut canvas = SvgCanvas::new(width, height, BG);
    canvas.text(
        width as f64 / 2.0,
        22.0,
        14,
        "middle",
        TEXT,
        "Member Commits By Month",
    );

    let plot_w = width as f64 - MARGIN_LEFT - MARGIN_RIGHT - LEGEND_WIDTH;
    let plot_h = height as f64 - MARGIN_TOP - MARGIN_BOTTOM;
    let base_y = MARGIN_TOP + plot_h;

    canvas.line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, base_y, MUTED);
    canvas.line(MARGIN_LEFT, base_y, MARGIN_LEFT + plot_w, base_y, MUTED);

    let months = chronological_months(report);
    if months.is_empty() || report.members.is_empty() {
        return canvas.finish();
    }

    let max = months
        .iter()
        .map(|month| month_total(&report.by_six_month[*month]))
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let slot = plot_w / months.len() as f64;
    let bar_w = (slot * 0.7).min(60.0);

    for (i, month) in months.iter().enumerate() {
        let counts = &report.by_six_month[*month];
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
        let mut top = base_y;

        for (m, member) in report.members.iter().enumerate() {
            let value = counts.get(member).copied().unwrap_or(0);
            if value == 0 {
                continue;
            }
            let segment_h = (value as f64 / max) * plot_h;
            top -= segment_h;
            canvas.rect(x, top, bar_w, segment_h, series_color(m));
        }

        canvas.text(
            x + bar_w / 2.0,
            base_y + 14.0,
            10,
            "middle",
            MUTED,
            month,
        );
    }

    let legend_entries: Vec<(&str, &'static str)> = report
        .members
        .iter()
        .enumerate()
        .map(|(m, member)| (member.as_str(), series_color(m)))
        .collect();
    legend(&mut canvas, width as f64 - LEGEND_WIDTH, &legend_entries);

    canvas.finish()
}

/// Bar of the four org-wide totals.
pub fn org_totals_bar(report: &Report, options: &RenderOptions) -> String {
    let data = [
        ("stars", report.total_stars),
        ("PRs", report.total_prs),
        ("merged PRs", report.total_merged_prs),
        ("contributions", report.total_contributions),
    ];
    bar_chart(
        "Organization Totals",
        &data,
        options.width,
        options.height,
        series_color,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthCounts;

    fn options() -> RenderOptions {
        RenderOptions {
            out_dir: PathBuf::from("img"),
            width: 600,
            height: 400,
        }
    }

    fn sample_report() -> Report {
        let mut report = Report::default();
        report.members = vec!["alice".to_string(), "bob".to_string()];
        report.total_stars = 10;
        report.total_prs = 5;
        report.total_merged_prs = 3;
        report.total_contributions = 42;
        report.total_languages.insert("Rust".to_string(), 3000);
        report.total_languages.insert("Python".to_string(), 1000);
        report.total_member_commits.insert("alice".to_string(), 30);
        report.total_member_commits.insert("bob".to_string(), 12);

        // Collection order: newest month first, summary appended last.
        report.by_six_month.insert(
            "6/2024".to_string(),
            MonthCounts::from([
                ("alice".to_string(), 2),
                ("bob".to_string(), 1),
                (TOTAL_KEY.to_string(), 3),
            ]),
        );
        report.by_six_month.insert(
            "5/2024".to_string(),
            MonthCounts::from([
                ("alice".to_string(), 3),
                ("bob".to_string(), 0),
                (TOTAL_KEY.to_string(), 3),
            ]),
        );
        report.by_six_month.insert(
            SUMMARY_KEY.to_string(),
            MonthCounts::from([
                ("alice".to_string(), 5),
                ("bob".to_string(), 1),
                (TOTAL_KEY.to_string(), 6),
            ]),
        );
        report
    }

    #[test]
    fn test_member_series_strips_synthetic_keys() {
        let counts = MonthCounts::from([
            ("alice".to_string(), 2),
            (TOTAL_KEY.to_string(), 2),
        ]);
        let series = member_series(&counts);
        assert_eq!(series, vec![("alice", 2)]);
    }

    #[test]
    fn test_chronological_months_reverses_and_drops_summary() {
        let report = sample_report();
        assert_eq!(chronological_months(&report), vec!["5/2024", "6/2024"]);
    }

    #[test]
    fn test_month_total_falls_back_to_member_sum() {
        // Unfiltered months carry no synthetic total.
        let counts = MonthCounts::from([
            ("alice".to_string(), 2),
            ("carol".to_string(), 7),
        ]);
        assert_eq!(month_total(&counts), 9);

        let filtered = MonthCounts::from([
            ("alice".to_string(), 2),
            (TOTAL_KEY.to_string(), 2),
        ]);
        assert_eq!(month_total(&filtered), 2);
    }

    #[test]
    fn test_languages_pie_has_slice_and_legend_per_language() {
        let svg = languages_pie(&sample_report(), &options());
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("Rust"));
        assert!(svg.contains("Python"));
        assert!(svg.contains("75.00%"));
    }

    #[test]
    fn test_single_language_renders_full_circle() {
        let mut report = Report::default();
        report.total_languages.insert("Rust".to_string(), 100);
        let svg = languages_pie(&report, &options());
        assert!(svg.contains("<circle"));
        assert_eq!(svg.matches("<path").count(), 0);
    }

    #[test]
    fn test_member_commits_bar_has_bar_per_member() {
        let svg = member_commits_bar(&sample_report(), &options());
        // Background rect plus one bar per member.
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("alice"));
        assert!(svg.contains("30"));
    }

    #[test]
    fn test_six_month_totals_line_is_chronological() {
        let svg = six_month_totals_line(&sample_report(), &options());
        assert!(svg.contains("<polyline"));
        let older = svg.find("5/2024").unwrap();
        let newer = svg.find("6/2024").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_stacked_chart_skips_zero_segments() {
        let svg = monthly_member_stacked(&sample_report(), &options());
        // Background + 3 non-zero segments + 2 legend squares.
        assert_eq!(svg.matches("<rect").count(), 6);
    }

    #[test]
    fn test_org_totals_bar_labels() {
        let svg = org_totals_bar(&sample_report(), &options());
        assert!(svg.contains("stars"));
        assert!(svg.contains("merged PRs"));
        assert!(svg.contains("42"));
    }

    #[test]
    fn test_empty_report_renders_frames_without_panicking() {
        let report = Report::default();
        let opts = options();
        for svg in [
            languages_pie(&report, &opts),
            member_commits_bar(&report, &opts),
            six_month_summary_bar(&report, &opts),
            six_month_totals_line(&report, &opts),
            monthly_member_stacked(&report, &opts),
            org_totals_bar(&report, &opts),
        ] {
            assert!(svg.starts_with("<svg"));
            assert!(svg.trim_end().ends_with("</svg>"));
        }
    }

    #[test]
    fn test_render_all_writes_six_files() {
        let dir = tempfile::tempdir().unwrap();
        let opts = RenderOptions {
            out_dir: dir.path().join("img"),
            width: 600,
            height: 400,
        };

        let written = render_all(&sample_report(), &opts).unwrap();
        assert_eq!(written.len(), 6);
        for path in &written {
            assert!(path.exists());
            let content = std::fs::read_to_string(path).unwrap();
            assert!(content.starts_with("<svg"));
        }
    }
}
