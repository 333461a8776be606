//! SQLite persistence for completed sessions.
//!
//! One table, `activity_sessions`, appended to by the collector and read by
//! the report commands. Timestamps are stored as RFC 3339 UTC text so range
//! filters compare lexically; day buckets use the local calendar date.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags, Row};
use serde::Serialize;
use std::path::{Path, PathBuf};

use worklog_core::CompletedSession;

pub struct Db {
    path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSession {
    pub id: i64,
    #[serde(flatten)]
    pub session: CompletedSession,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: String,
    pub total_seconds: f64,
    pub repos_count: u64,
    pub sessions_count: u64,
    pub files_changed: u64,
    pub lines_changed: u64,
    pub avg_session_seconds: f64,
    pub avg_productivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoStats {
    pub repo_path: String,
    pub repo_name: String,
    pub total_seconds: f64,
    pub sessions_count: u64,
    pub avg_productivity: f64,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

impl RepoStats {
    pub fn lines_changed(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

const SESSION_COLUMNS: &str = "id, repo_path, repo_name, start_time, end_time, duration_seconds, \
     commit_hash, commit_message, task_name, files_changed, lines_added, lines_deleted, \
     productivity_score, created_at";

impl Db {
    pub fn new(path: PathBuf) -> Result<Self, String> {
        let db = Self { path };
        db.init_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert_session(&self, session: &CompletedSession) -> Result<i64, String> {
        self.insert_session_at(session, Utc::now())
    }

    pub fn insert_session_at(
        &self,
        session: &CompletedSession,
        created_at: DateTime<Utc>,
    ) -> Result<i64, String> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO activity_sessions \
                    (repo_path, repo_name, start_time, end_time, duration_seconds, \
                     commit_hash, commit_message, task_name, files_changed, lines_added, \
                     lines_deleted, productivity_score, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    session.repo_path,
                    session.repo_name,
                    format_timestamp(&session.start_time),
                    format_timestamp(&session.end_time),
                    session.duration_seconds,
                    session.commit_hash,
                    session.commit_message,
                    session.task_name,
                    session.files_changed as i64,
                    session.lines_added as i64,
                    session.lines_deleted as i64,
                    session.productivity_score,
                    format_timestamp(&created_at),
                ],
            )
            .map_err(|err| format!("Failed to insert session: {}", err))?;

            Ok(conn.last_insert_rowid())
        })
    }

    /// Sessions that ended at or after `since`, most recent first.
    pub fn list_sessions(&self, since: DateTime<Utc>) -> Result<Vec<StoredSession>, String> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {} FROM activity_sessions WHERE end_time >= ?1 \
                 ORDER BY end_time DESC, id DESC",
                SESSION_COLUMNS
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|err| format!("Failed to prepare sessions query: {}", err))?;
            let rows = stmt
                .query_map(params![format_timestamp(&since)], read_session_row)
                .map_err(|err| format!("Failed to read session rows: {}", err))?;

            let mut sessions = Vec::new();
            for row in rows {
                let row = row.map_err(|err| format!("Failed to decode session row: {}", err))?;
                sessions.push(row.into_stored()?);
            }
            Ok(sessions)
        })
    }

    /// Per-day totals since `since`, newest day first.
    pub fn daily_stats(&self, since: DateTime<Utc>) -> Result<Vec<DailyStats>, String> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT date(end_time, 'localtime') AS day, \
                        SUM(duration_seconds), \
                        COUNT(DISTINCT repo_path), \
                        COUNT(*), \
                        SUM(files_changed), \
                        SUM(lines_added + lines_deleted), \
                        AVG(duration_seconds), \
                        AVG(productivity_score) \
                     FROM activity_sessions \
                     WHERE end_time >= ?1 \
                     GROUP BY day \
                     ORDER BY day DESC",
                )
                .map_err(|err| format!("Failed to prepare daily stats query: {}", err))?;

            let rows = stmt
                .query_map(params![format_timestamp(&since)], |row| {
                    Ok(DailyStats {
                        date: row.get(0)?,
                        total_seconds: row.get(1)?,
                        repos_count: row.get::<_, i64>(2)? as u64,
                        sessions_count: row.get::<_, i64>(3)? as u64,
                        files_changed: row.get::<_, i64>(4)? as u64,
                        lines_changed: row.get::<_, i64>(5)? as u64,
                        avg_session_seconds: row.get(6)?,
                        avg_productivity: row.get(7)?,
                    })
                })
                .map_err(|err| format!("Failed to read daily stats: {}", err))?;

            let stats = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| format!("Failed to decode daily stats: {}", err))?;
            Ok(stats)
        })
    }

    /// Per-repository totals since `since`, most time first.
    pub fn repo_stats(&self, since: DateTime<Utc>) -> Result<Vec<RepoStats>, String> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT repo_path, MAX(repo_name), \
                        SUM(duration_seconds), \
                        COUNT(*), \
                        AVG(productivity_score), \
                        SUM(files_changed), \
                        SUM(lines_added), \
                        SUM(lines_deleted) \
                     FROM activity_sessions \
                     WHERE end_time >= ?1 \
                     GROUP BY repo_path \
                     ORDER BY SUM(duration_seconds) DESC, repo_path ASC",
                )
                .map_err(|err| format!("Failed to prepare repo stats query: {}", err))?;

            let rows = stmt
                .query_map(params![format_timestamp(&since)], |row| {
                    Ok(RepoStats {
                        repo_path: row.get(0)?,
                        repo_name: row.get(1)?,
                        total_seconds: row.get(2)?,
                        sessions_count: row.get::<_, i64>(3)? as u64,
                        avg_productivity: row.get(4)?,
                        files_changed: row.get::<_, i64>(5)? as u64,
                        lines_added: row.get::<_, i64>(6)? as u64,
                        lines_deleted: row.get::<_, i64>(7)? as u64,
                    })
                })
                .map_err(|err| format!("Failed to read repo stats: {}", err))?;

            let stats = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| format!("Failed to decode repo stats: {}", err))?;
            Ok(stats)
        })
    }

    fn init_schema(&self) -> Result<(), String> {
        self.with_connection(|conn| {
            conn.execute_batch(
                "BEGIN;
                 CREATE TABLE IF NOT EXISTS activity_sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    repo_path TEXT NOT NULL,
                    repo_name TEXT NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL,
                    duration_seconds REAL NOT NULL,
                    commit_hash TEXT NOT NULL,
                    commit_message TEXT NOT NULL,
                    task_name TEXT NOT NULL,
                    files_changed INTEGER NOT NULL DEFAULT 0,
                    lines_added INTEGER NOT NULL DEFAULT 0,
                    lines_deleted INTEGER NOT NULL DEFAULT 0,
                    productivity_score REAL NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_activity_sessions_end_time
                    ON activity_sessions(end_time);
                 CREATE INDEX IF NOT EXISTS idx_activity_sessions_repo
                    ON activity_sessions(repo_path);
                 COMMIT;",
            )
            .map_err(|err| format!("Failed to initialize schema: {}", err))
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, String>,
    ) -> Result<T, String> {
        let mut conn = self.open()?;
        op(&mut conn)
    }

    fn open(&self) -> Result<Connection, String> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|err| format!("Failed to create data dir: {}", err))?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let conn = Connection::open_with_flags(&self.path, flags)
            .map_err(|err| format!("Failed to open sqlite db: {}", err))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| format!("Failed to enable WAL: {}", err))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|err| format!("Failed to set busy_timeout: {}", err))?;

        Ok(conn)
    }
}

/// Raw row; timestamps are parsed after the rusqlite closure so a bad value
/// surfaces as a readable error.
struct SessionRow {
    id: i64,
    repo_path: String,
    repo_name: String,
    start_time: String,
    end_time: String,
    duration_seconds: f64,
    commit_hash: String,
    commit_message: String,
    task_name: String,
    files_changed: i64,
    lines_added: i64,
    lines_deleted: i64,
    productivity_score: f64,
    created_at: String,
}

impl SessionRow {
    fn into_stored(self) -> Result<StoredSession, String> {
        let start_time = parse_rfc3339(&self.start_time)
            .ok_or_else(|| format!("Invalid start_time in session {}", self.id))?;
        let end_time = parse_rfc3339(&self.end_time)
            .ok_or_else(|| format!("Invalid end_time in session {}", self.id))?;

        Ok(StoredSession {
            id: self.id,
            session: CompletedSession {
                repo_path: self.repo_path,
                repo_name: self.repo_name,
                start_time,
                end_time,
                duration_seconds: self.duration_seconds,
                commit_hash: self.commit_hash,
                commit_message: self.commit_message,
                task_name: self.task_name,
                files_changed: self.files_changed.max(0) as u64,
                lines_added: self.lines_added.max(0) as u64,
                lines_deleted: self.lines_deleted.max(0) as u64,
                productivity_score: self.productivity_score,
            },
            created_at: self.created_at,
        })
    }
}

fn read_session_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        repo_path: row.get(1)?,
        repo_name: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        duration_seconds: row.get(5)?,
        commit_hash: row.get(6)?,
        commit_message: row.get(7)?,
        task_name: row.get(8)?,
        files_changed: row.get(9)?,
        lines_added: row.get(10)?,
        lines_deleted: row.get(11)?,
        productivity_score: row.get(12)?,
        created_at: row.get(13)?,
    })
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn session(repo: &str, end: DateTime<Utc>, minutes: i64) -> CompletedSession {
        CompletedSession {
            repo_path: format!("/code/{}", repo),
            repo_name: repo.to_string(),
            start_time: end - Duration::minutes(minutes),
            end_time: end,
            duration_seconds: (minutes * 60) as f64,
            commit_hash: format!("{:0>40}", minutes),
            commit_message: "feat: add exporter".to_string(),
            task_name: "Add Exporter".to_string(),
            files_changed: 3,
            lines_added: 30,
            lines_deleted: 10,
            productivity_score: 50.0,
        }
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    fn temp_db() -> (tempfile::TempDir, Db) {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let db = Db::new(temp_dir.path().join("activity_monitor.db")).expect("db init");
        (temp_dir, db)
    }

    #[test]
    fn inserts_and_lists_sessions_newest_first() {
        let (_dir, db) = temp_db();
        let first = db.insert_session(&session("api", noon(10), 30)).expect("insert");
        let second = db.insert_session(&session("web", noon(11), 45)).expect("insert");
        assert!(second > first);

        let sessions = db.list_sessions(noon(1)).expect("list");
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session.repo_name, "web");
        assert_eq!(sessions[0].session.end_time, noon(11));
        assert_eq!(sessions[0].session.duration_seconds, 2700.0);
        assert_eq!(sessions[1].session, session("api", noon(10), 30));
    }

    #[test]
    fn list_respects_window() {
        let (_dir, db) = temp_db();
        db.insert_session(&session("api", noon(1), 30)).expect("insert");
        db.insert_session(&session("api", noon(20), 30)).expect("insert");

        let sessions = db.list_sessions(noon(15)).expect("list");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session.end_time, noon(20));
    }

    #[test]
    fn daily_stats_groups_by_day() {
        let (_dir, db) = temp_db();
        db.insert_session(&session("api", noon(10), 30)).expect("insert");
        db.insert_session(&session("web", noon(10) + Duration::minutes(30), 30))
            .expect("insert");
        db.insert_session(&session("api", noon(11), 60)).expect("insert");

        let days = db.daily_stats(noon(1)).expect("stats");
        assert_eq!(days.len(), 2);

        let latest = &days[0];
        assert_eq!(latest.sessions_count, 1);
        assert_eq!(latest.total_seconds, 3600.0);

        let earlier = &days[1];
        assert_eq!(earlier.sessions_count, 2);
        assert_eq!(earlier.repos_count, 2);
        assert_eq!(earlier.total_seconds, 3600.0);
        assert_eq!(earlier.files_changed, 6);
        assert_eq!(earlier.lines_changed, 80);
        assert_eq!(earlier.avg_session_seconds, 1800.0);
        assert_eq!(earlier.avg_productivity, 50.0);
    }

    #[test]
    fn repo_stats_orders_by_total_time() {
        let (_dir, db) = temp_db();
        db.insert_session(&session("api", noon(10), 30)).expect("insert");
        db.insert_session(&session("web", noon(10), 90)).expect("insert");
        db.insert_session(&session("api", noon(11), 20)).expect("insert");

        let repos = db.repo_stats(noon(1)).expect("stats");
        let names: Vec<_> = repos.iter().map(|repo| repo.repo_name.as_str()).collect();
        assert_eq!(names, vec!["web", "api"]);
        assert_eq!(repos[1].sessions_count, 2);
        assert_eq!(repos[1].total_seconds, 3000.0);
        assert_eq!(repos[1].lines_changed(), 80);
    }

    #[test]
    fn empty_store_returns_no_rows() {
        let (_dir, db) = temp_db();
        assert!(db.list_sessions(noon(1)).expect("list").is_empty());
        assert!(db.daily_stats(noon(1)).expect("stats").is_empty());
        assert!(db.repo_stats(noon(1)).expect("stats").is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("nested").join("activity_monitor.db");
        Db::new(path.clone())
            .expect("db init")
            .insert_session(&session("api", noon(10), 30))
            .expect("insert");

        let reopened = Db::new(path).expect("db reopen");
        assert_eq!(reopened.list_sessions(noon(1)).expect("list").len(), 1);
    }
}
