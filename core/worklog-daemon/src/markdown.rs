//! Markdown output: the daily timesheet and weekly/monthly summaries.
//!
//! The timesheet is one file per local day (`<log_dir>/YYYY-MM-DD.md`). Each
//! completed session adds a row to the summary table (newest first) and a
//! detail entry under its repository's section.

use chrono::{DateTime, Datelike, Local, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use worklog_core::CompletedSession;

use crate::db::{DailyStats, RepoStats, StoredSession};

const SUMMARY_TABLE_HEADER: &str =
    "| Time | Repository | Duration | Files | Lines | Productivity | Commit |";
const SUMMARY_TABLE_SEPARATOR: &str =
    "|------|------------|----------|-------|-------|--------------|--------|";
const REPO_HEADING_PREFIX: &str = "## Repository: ";

pub fn timesheet_path(log_dir: &Path, date: NaiveDate) -> PathBuf {
    log_dir.join(format!("{}.md", date.format("%Y-%m-%d")))
}

/// Adds `record` to the timesheet for the local day it ended on.
pub fn append_session(log_dir: &Path, record: &CompletedSession) -> Result<PathBuf, String> {
    let ended = record.end_time.with_timezone(&Local);
    let path = timesheet_path(log_dir, ended.date_naive());

    fs_err::create_dir_all(log_dir)
        .map_err(|err| format!("Failed to create log directory: {}", err))?;

    let existing = if path.exists() {
        fs_err::read_to_string(&path).map_err(|err| format!("Failed to read timesheet: {}", err))?
    } else {
        new_timesheet(ended.date_naive())
    };

    let updated = insert_session(&existing, record, &ended);
    fs_err::write(&path, updated).map_err(|err| format!("Failed to write timesheet: {}", err))?;
    Ok(path)
}

fn new_timesheet(date: NaiveDate) -> String {
    format!(
        "# Git Activity Log - {}\n\n## Daily Summary\n\n{}\n{}\n",
        date.format("%Y-%m-%d"),
        SUMMARY_TABLE_HEADER,
        SUMMARY_TABLE_SEPARATOR
    )
}

fn insert_session(content: &str, record: &CompletedSession, ended: &DateTime<Local>) -> String {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    let row = summary_row(record, ended);
    match lines
        .iter()
        .position(|line| line.starts_with(SUMMARY_TABLE_SEPARATOR))
    {
        Some(index) => lines.insert(index + 1, row),
        None => {
            // Table header was edited away; start a fresh one at the end.
            lines.push(String::new());
            lines.push(SUMMARY_TABLE_HEADER.to_string());
            lines.push(SUMMARY_TABLE_SEPARATOR.to_string());
            lines.push(row);
        }
    }

    let heading = format!("{}{}", REPO_HEADING_PREFIX, record.repo_name);
    let section_start = match lines.iter().position(|line| *line == heading) {
        Some(index) => index,
        None => {
            if lines.last().map(|line| !line.is_empty()).unwrap_or(false) {
                lines.push(String::new());
            }
            lines.push(heading);
            lines.push(String::new());
            lines.len() - 2
        }
    };

    // Detail entries go at the end of the repository's section.
    let section_end = lines
        .iter()
        .enumerate()
        .skip(section_start + 1)
        .find(|(_, line)| line.starts_with("## "))
        .map(|(index, _)| index)
        .unwrap_or(lines.len());

    let detail = detail_entry(record, ended);
    lines.splice(section_end..section_end, detail);

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

fn summary_row(record: &CompletedSession, ended: &DateTime<Local>) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {:.1}/100 | {} |",
        ended.format("%H:%M"),
        record.repo_name,
        format_minutes(record.duration_seconds),
        record.files_changed,
        record.lines_changed(),
        record.productivity_score,
        record.short_hash()
    )
}

fn detail_entry(record: &CompletedSession, ended: &DateTime<Local>) -> Vec<String> {
    let duration = format_minutes(record.duration_seconds);
    let subject = record.commit_message.lines().next().unwrap_or("").trim();
    vec![
        format!("### {} - {}", ended.format("%H:%M"), duration),
        String::new(),
        format!("**Task:** {}", record.task_name),
        String::new(),
        format!("**Commit:** `{}` - {}", record.short_hash(), subject),
        String::new(),
        format!("- **Duration:** {}", duration),
        format!("- **Files changed:** {}", record.files_changed),
        format!("- **Lines added:** {}", record.lines_added),
        format!("- **Lines deleted:** {}", record.lines_deleted),
        format!("- **Productivity score:** {:.1}/100", record.productivity_score),
        String::new(),
        "---".to_string(),
        String::new(),
    ]
}

fn format_minutes(seconds: f64) -> String {
    format!("{:.1}min", seconds / 60.0)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Summaries
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryPeriod {
    Week,
    Month,
}

impl SummaryPeriod {
    pub fn days(self) -> i64 {
        match self {
            SummaryPeriod::Week => 7,
            SummaryPeriod::Month => 30,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SummaryPeriod::Week => "Weekly",
            SummaryPeriod::Month => "Monthly",
        }
    }

    /// `weekly_summary_YYYY_WNN.md` (Sunday-based week) or `monthly_summary_YYYY_MM.md`.
    pub fn file_name(self, now: &DateTime<Local>) -> String {
        match self {
            SummaryPeriod::Week => format!("weekly_summary_{}.md", now.format("%Y_W%U")),
            SummaryPeriod::Month => {
                format!("monthly_summary_{}_{:02}.md", now.year(), now.month())
            }
        }
    }
}

pub struct SummaryInput<'a> {
    pub period: SummaryPeriod,
    pub now: DateTime<Local>,
    pub daily: &'a [DailyStats],
    pub repos: &'a [RepoStats],
    pub sessions: &'a [StoredSession],
}

/// Renders the summary document, or `None` when there is nothing to report.
pub fn render_summary(input: &SummaryInput<'_>) -> Option<String> {
    if input.daily.is_empty() {
        return None;
    }

    let total_seconds: f64 = input.daily.iter().map(|day| day.total_seconds).sum();
    let total_hours = total_seconds / 3600.0;
    let total_sessions: u64 = input.daily.iter().map(|day| day.sessions_count).sum();
    let avg_productivity = input
        .daily
        .iter()
        .map(|day| day.avg_productivity)
        .sum::<f64>()
        / input.daily.len() as f64;
    let top_repos = top_repo_by_day(input.sessions);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {} Coding Summary - {}\n",
        input.period.title(),
        input.now.format("%B %d, %Y")
    );

    out.push_str("## Overview\n\n");
    let _ = writeln!(out, "- **Total coding time:** {:.1} hours", total_hours);
    let _ = writeln!(out, "- **Total sessions:** {}", total_sessions);
    let _ = writeln!(out, "- **Repositories worked on:** {}", input.repos.len());
    let _ = writeln!(out, "- **Average productivity:** {:.1}/100", avg_productivity);
    let _ = writeln!(
        out,
        "- **Average daily time:** {:.1} hours\n",
        total_hours / input.daily.len() as f64
    );

    out.push_str("## Daily Breakdown\n\n");
    out.push_str("| Date | Hours | Sessions | Repos | Productivity | Top Repository |\n");
    out.push_str("|------|-------|----------|-------|--------------|----------------|\n");
    for day in input.daily {
        let top = top_repos
            .get(&day.date)
            .map(String::as_str)
            .unwrap_or("N/A");
        let _ = writeln!(
            out,
            "| {} | {:.1}h | {} | {} | {:.1} | {} |",
            day.date,
            day.total_seconds / 3600.0,
            day.sessions_count,
            day.repos_count,
            day.avg_productivity,
            top
        );
    }
    out.push('\n');

    if !input.repos.is_empty() {
        out.push_str("## Repository Analysis\n\n");
        out.push_str("| Repository | Hours | Sessions | Avg Productivity | Files | Lines Changed |\n");
        out.push_str("|------------|-------|----------|------------------|-------|---------------|\n");
        for repo in input.repos {
            let _ = writeln!(
                out,
                "| {} | {:.1}h | {} | {:.1} | {} | {} |",
                repo.repo_name,
                repo.total_seconds / 3600.0,
                repo.sessions_count,
                repo.avg_productivity,
                repo.files_changed,
                repo.lines_changed()
            );
        }
        out.push('\n');
    }

    if input.daily.len() > 1 {
        out.push_str("## Productivity Insights\n\n");
        let by_score = |a: &&DailyStats, b: &&DailyStats| {
            a.avg_productivity.total_cmp(&b.avg_productivity)
        };
        if let Some(best) = input.daily.iter().max_by(by_score) {
            let _ = writeln!(
                out,
                "- **Most productive day:** {} ({:.1}/100)",
                best.date, best.avg_productivity
            );
        }
        if let Some(busiest) = input
            .daily
            .iter()
            .max_by(|a, b| a.total_seconds.total_cmp(&b.total_seconds))
        {
            let _ = writeln!(
                out,
                "- **Most active day:** {} ({:.1} hours)",
                busiest.date,
                busiest.total_seconds / 3600.0
            );
        }
        if let Some(worst) = input.daily.iter().min_by(by_score) {
            let _ = writeln!(
                out,
                "- **Room for improvement:** {} ({:.1}/100)",
                worst.date, worst.avg_productivity
            );
        }
        out.push('\n');
    }

    out.push_str("---\n");
    let _ = writeln!(
        out,
        "*Generated by worklog on {}*",
        input.now.format("%Y-%m-%d %H:%M:%S")
    );
    Some(out)
}

/// Writes the rendered summary under `summaries_dir`.
pub fn write_summary(summaries_dir: &Path, input: &SummaryInput<'_>) -> Result<Option<PathBuf>, String> {
    let Some(document) = render_summary(input) else {
        return Ok(None);
    };

    fs_err::create_dir_all(summaries_dir)
        .map_err(|err| format!("Failed to create summaries directory: {}", err))?;
    let path = summaries_dir.join(input.period.file_name(&input.now));
    fs_err::write(&path, document).map_err(|err| format!("Failed to write summary: {}", err))?;
    Ok(Some(path))
}

/// Repository with the most time on each local day, keyed like `DailyStats::date`.
fn top_repo_by_day(sessions: &[StoredSession]) -> HashMap<String, String> {
    let mut per_day: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for stored in sessions {
        let day = stored
            .session
            .end_time
            .with_timezone(&Local)
            .format("%Y-%m-%d")
            .to_string();
        *per_day
            .entry(day)
            .or_default()
            .entry(stored.session.repo_name.clone())
            .or_default() += stored.session.duration_seconds;
    }

    per_day
        .into_iter()
        .filter_map(|(day, repos)| {
            repos
                .into_iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(repo, _)| (day, repo))
        })
        .collect()
}
