//! Plain-text tables for the report commands and the live status log.

use std::fmt::Write as _;

use worklog_core::{RepoActivity, RepoStatus};

use crate::db::{DailyStats, RepoStats};

/// Left-aligned columns sized to their widest cell.
struct TextTable {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn lines(&self) -> Vec<String> {
        let widths = self.widths();
        let render = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![render(self.headers.clone())];
        lines.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            lines.push(render(row.iter().map(String::as_str).collect()));
        }
        lines
    }
}

pub fn render_daily_report(days: i64, stats: &[DailyStats]) -> String {
    if stats.is_empty() {
        return "No data available for report\n".to_string();
    }

    let mut table = TextTable::new(vec![
        "Date",
        "Time Spent",
        "Repos",
        "Sessions",
        "Files",
        "Lines",
        "Productivity",
    ]);
    for day in stats {
        table.push(vec![
            day.date.clone(),
            format!("{:.1}h", day.total_seconds / 3600.0),
            day.repos_count.to_string(),
            day.sessions_count.to_string(),
            day.files_changed.to_string(),
            day.lines_changed.to_string(),
            format!("{:.1}/100", day.avg_productivity),
        ]);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Daily Activity Report (Last {} days)\n", days);
    for line in table.lines() {
        let _ = writeln!(out, "{}", line);
    }
    out
}

pub fn render_repo_report(stats: &[RepoStats]) -> String {
    if stats.is_empty() {
        return String::new();
    }

    let mut table = TextTable::new(vec![
        "Repository",
        "Hours",
        "Sessions",
        "Avg Productivity",
        "Files",
        "Lines Changed",
    ]);
    for repo in stats {
        table.push(vec![
            repo.repo_name.clone(),
            format!("{:.1}h", repo.total_seconds / 3600.0),
            repo.sessions_count.to_string(),
            format!("{:.1}", repo.avg_productivity),
            repo.files_changed.to_string(),
            repo.lines_changed().to_string(),
        ]);
    }

    let mut out = String::from("Repository Breakdown\n\n");
    for line in table.lines() {
        let _ = writeln!(out, "{}", line);
    }
    out
}

/// Live status table lines, empty when nothing is being tracked.
pub fn live_status_lines(statuses: &[RepoStatus]) -> Vec<String> {
    if statuses.is_empty() {
        return Vec::new();
    }

    let mut table = TextTable::new(vec!["Repository", "Status", "Time", "Files Changed"]);
    for status in statuses {
        let (label, seconds) = match status.activity {
            RepoActivity::Active { elapsed_seconds } => ("Active", elapsed_seconds),
            RepoActivity::Accumulated { seconds } => ("Accumulated", seconds),
        };
        table.push(vec![
            status.repo_name.clone(),
            label.to_string(),
            format!("{:.1}m", seconds / 60.0),
            status.files_changed.to_string(),
        ]);
    }
    table.lines()
}

#[cfg(test)]
mod tests {
    use super::*;
    use worklog_core::RepoKey;

    #[test]
    fn daily_report_lists_each_day() {
        let stats = vec![DailyStats {
            date: "2025-03-14".to_string(),
            total_seconds: 5400.0,
            repos_count: 2,
            sessions_count: 3,
            files_changed: 7,
            lines_changed: 120,
            avg_session_seconds: 1800.0,
            avg_productivity: 61.3,
        }];

        let report = render_daily_report(7, &stats);
        assert!(report.starts_with("Daily Activity Report (Last 7 days)"));
        let row = report
            .lines()
            .find(|line| line.starts_with("2025-03-14"))
            .expect("row");
        let cells: Vec<_> = row.split_whitespace().collect();
        assert_eq!(cells, vec!["2025-03-14", "1.5h", "2", "3", "7", "120", "61.3/100"]);
    }

    #[test]
    fn empty_daily_report_says_so() {
        assert_eq!(render_daily_report(30, &[]), "No data available for report\n");
    }

    #[test]
    fn columns_align_to_widest_cell() {
        let stats = vec![
            RepoStats {
                repo_path: "/code/a".to_string(),
                repo_name: "a".to_string(),
                total_seconds: 3600.0,
                sessions_count: 1,
                avg_productivity: 50.0,
                files_changed: 1,
                lines_added: 1,
                lines_deleted: 0,
            },
            RepoStats {
                repo_path: "/code/long-repository-name".to_string(),
                repo_name: "long-repository-name".to_string(),
                total_seconds: 1800.0,
                sessions_count: 12,
                avg_productivity: 75.0,
                files_changed: 10,
                lines_added: 100,
                lines_deleted: 20,
            },
        ];

        let report = render_repo_report(&stats);
        let rows: Vec<_> = report
            .lines()
            .filter(|line| line.starts_with("a ") || line.starts_with("long-"))
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].find("1.0h"), rows[1].find("0.5h"));
    }

    #[test]
    fn live_status_shows_both_states() {
        let statuses = vec![
            RepoStatus {
                repo: RepoKey::new("/code/api"),
                repo_name: "api".to_string(),
                activity: RepoActivity::Active {
                    elapsed_seconds: 90.0,
                },
                files_changed: 2,
            },
            RepoStatus {
                repo: RepoKey::new("/code/web"),
                repo_name: "web".to_string(),
                activity: RepoActivity::Accumulated { seconds: 600.0 },
                files_changed: 5,
            },
        ];

        let lines = live_status_lines(&statuses);
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[2].split_whitespace().collect::<Vec<_>>(),
            vec!["api", "Active", "1.5m", "2"]
        );
        assert_eq!(
            lines[3].split_whitespace().collect::<Vec<_>>(),
            vec!["web", "Accumulated", "10.0m", "5"]
        );
        assert!(live_status_lines(&[]).is_empty());
    }
}
