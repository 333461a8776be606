//! CSV / JSON export of stored sessions.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::db::{format_timestamp, StoredSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

const CSV_HEADER: &[&str] = &[
    "id",
    "repo_path",
    "repo_name",
    "start_time",
    "end_time",
    "duration_seconds",
    "commit_hash",
    "commit_message",
    "task_name",
    "files_changed",
    "lines_added",
    "lines_deleted",
    "productivity_score",
    "created_at",
];

/// Writes `<log_dir>/activity_export_<YYYYmmdd_HHMMSS>.<ext>`.
///
/// Returns `None` without touching the filesystem when there is nothing to export.
pub fn export_sessions(
    log_dir: &Path,
    sessions: &[StoredSession],
    format: ExportFormat,
    now: DateTime<Local>,
) -> Result<Option<PathBuf>, String> {
    if sessions.is_empty() {
        return Ok(None);
    }

    let body = match format {
        ExportFormat::Csv => render_csv(sessions),
        ExportFormat::Json => render_json(sessions)?,
    };

    fs_err::create_dir_all(log_dir)
        .map_err(|err| format!("Failed to create export directory: {}", err))?;
    let path = log_dir.join(format!(
        "activity_export_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ));
    fs_err::write(&path, body).map_err(|err| format!("Failed to write export: {}", err))?;
    Ok(Some(path))
}

pub fn render_json(sessions: &[StoredSession]) -> Result<String, String> {
    serde_json::to_string_pretty(sessions)
        .map_err(|err| format!("Failed to serialize sessions: {}", err))
}

pub fn render_csv(sessions: &[StoredSession]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for stored in sessions {
        let session = &stored.session;
        let fields = [
            stored.id.to_string(),
            session.repo_path.clone(),
            session.repo_name.clone(),
            format_timestamp(&session.start_time),
            format_timestamp(&session.end_time),
            session.duration_seconds.to_string(),
            session.commit_hash.clone(),
            session.commit_message.clone(),
            session.task_name.clone(),
            session.files_changed.to_string(),
            session.lines_added.to_string(),
            session.lines_deleted.to_string(),
            session.productivity_score.to_string(),
            stored.created_at.clone(),
        ];
        let row = fields
            .iter()
            .map(|field| escape_csv(field))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

/// RFC 4180 quoting: fields with commas, quotes or line breaks are wrapped
/// in quotes and inner quotes are doubled.
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::session;
    use chrono::{TimeZone, Utc};

    fn stored(id: i64, message: &str) -> StoredSession {
        let mut record = session(
            "api",
            Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap(),
            30,
        );
        record.commit_message = message.to_string();
        StoredSession {
            id,
            session: record,
            created_at: "2025-03-14T12:00:01.000Z".to_string(),
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_session() {
        let csv = render_csv(&[stored(1, "feat: add exporter"), stored(2, "fix: typo")]);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,repo_path,repo_name,start_time"));
        assert!(lines[1].starts_with("1,/code/api,api,2025-03-14T11:30:00.000Z,2025-03-14T12:00:00.000Z,1800,"));
    }

    #[test]
    fn csv_quotes_awkward_fields() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a, b"), "\"a, b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn json_flattens_session_fields() {
        let json = render_json(&[stored(7, "feat: add exporter")]).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        let first = &value[0];
        assert_eq!(first["id"], 7);
        assert_eq!(first["repo_name"], "api");
        assert_eq!(first["task_name"], "Add Exporter");
        assert_eq!(first["files_changed"], 3);
    }

    #[test]
    fn export_writes_timestamped_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let now = Local.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();
        let path = export_sessions(
            temp_dir.path(),
            &[stored(1, "feat: add exporter")],
            ExportFormat::Json,
            now,
        )
        .expect("export")
        .expect("path");
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("activity_export_20250314_093005.json")
        );
        assert!(path.exists());
    }

    #[test]
    fn empty_export_writes_nothing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let result = export_sessions(temp_dir.path(), &[], ExportFormat::Csv, Local::now())
            .expect("export");
        assert!(result.is_none());
        assert_eq!(std::fs::read_dir(temp_dir.path()).expect("read dir").count(), 0);
    }
}
