//! worklog entrypoint.
//!
//! `worklog start` runs the collector: a recursive watcher over the monitor
//! path feeds the session engine, and a tick thread sweeps repositories for
//! idle pauses and new commits. Completed sessions land in SQLite and,
//! optionally, the daily Markdown timesheet. The other subcommands are
//! read-only views over the database.

use chrono::{Duration as ChronoDuration, Local, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use worklog_core::{load_config, Config, EngineSettings, GitInspector, SessionEngine};

mod chart;
mod db;
mod export;
mod logging;
mod markdown;
mod report;
mod sinks;
mod ticker;
mod watcher;

use db::Db;
use export::ExportFormat;
use markdown::{SummaryInput, SummaryPeriod};
use sinks::{FanoutSink, MarkdownSink, SqliteSink};
use ticker::TickSettings;

#[derive(Parser)]
#[command(name = "worklog", version, about = "Commit-scoped coding time tracker")]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/worklog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the monitor path and record sessions until interrupted
    Start,
    /// Print the daily activity table
    Status {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Write a Markdown summary for the last week or month
    Summary {
        #[arg(long, value_enum, default_value_t = SummaryPeriod::Week)]
        period: SummaryPeriod,
    },
    /// Print the daily and per-repository tables and write the trend chart
    Report {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Export stored sessions to CSV or JSON
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            logging::init(&Config::default().logs_dir());
            error!(error = %err, "Failed to load config");
            std::process::exit(1);
        }
    };
    logging::init(&config.logs_dir());

    let result = match cli.command {
        Command::Start => run_collector(&config),
        Command::Status { days } => run_status(&config, days),
        Command::Summary { period } => run_summary(&config, period),
        Command::Report { days } => run_report(&config, days),
        Command::Export { format, days } => run_export(&config, format, days),
    };

    if let Err(err) = result {
        error!(error = %err, "worklog failed");
        std::process::exit(1);
    }
}

fn run_collector(config: &Config) -> Result<(), String> {
    let monitor_path = config.monitor_path_buf();
    if !monitor_path.is_dir() {
        return Err(format!(
            "Monitor path is not a directory: {}",
            monitor_path.display()
        ));
    }

    let db = Db::new(config.database_path())?;
    info!(path = %db.path().display(), "Database ready");

    let mut fanout = FanoutSink::new().with("sqlite", SqliteSink::new(db));
    if config.markdown_log {
        fanout = fanout.with("markdown", MarkdownSink::new(config.log_dir_path()));
    }

    let fanout_len = fanout.len();
    let engine = Arc::new(SessionEngine::new(
        EngineSettings::from(config),
        Arc::new(GitInspector::new(config.git_timeout())),
        Arc::new(fanout),
    ));

    let _watcher = watcher::spawn(&monitor_path, Arc::clone(&engine))?;

    info!(
        monitor_path = %monitor_path.display(),
        idle_threshold_secs = config.idle_threshold_secs,
        scan_interval_secs = config.scan_interval().as_secs(),
        sinks = fanout_len,
        "Collector started"
    );

    let handle = ticker::spawn(
        engine,
        TickSettings {
            interval: config.scan_interval(),
            status_every: config.status_every_ticks,
        },
    )?;
    handle
        .join()
        .map_err(|_| "Tick thread panicked".to_string())
}

fn since_days(days: u32) -> chrono::DateTime<Utc> {
    Utc::now() - ChronoDuration::days(i64::from(days))
}

fn run_status(config: &Config, days: u32) -> Result<(), String> {
    let db = Db::new(config.database_path())?;
    let daily = db.daily_stats(since_days(days))?;
    print!("{}", report::render_daily_report(i64::from(days), &daily));
    Ok(())
}

fn run_report(config: &Config, days: u32) -> Result<(), String> {
    let db = Db::new(config.database_path())?;
    let since = since_days(days);
    let daily = db.daily_stats(since)?;
    let repos = db.repo_stats(since)?;

    print!("{}", report::render_daily_report(i64::from(days), &daily));
    let breakdown = report::render_repo_report(&repos);
    if !breakdown.is_empty() {
        println!();
        print!("{}", breakdown);
    }

    match chart::write_productivity_chart(&config.log_dir_path(), &daily)? {
        Some(path) => println!("\nChart saved to: {}", path.display()),
        None => println!("No data available for charts"),
    }
    Ok(())
}

fn run_summary(config: &Config, period: SummaryPeriod) -> Result<(), String> {
    let db = Db::new(config.database_path())?;
    let since = Utc::now() - ChronoDuration::days(period.days());
    let daily = db.daily_stats(since)?;
    let repos = db.repo_stats(since)?;
    let sessions = db.list_sessions(since)?;

    let input = SummaryInput {
        period,
        now: Local::now(),
        daily: &daily,
        repos: &repos,
        sessions: &sessions,
    };
    match markdown::write_summary(&config.summaries_dir(), &input)? {
        Some(path) => println!("{} summary written to {}", period.title(), path.display()),
        None => println!("No activity data found for summary"),
    }
    Ok(())
}

fn run_export(config: &Config, format: ExportFormat, days: u32) -> Result<(), String> {
    let db = Db::new(config.database_path())?;
    let sessions = db.list_sessions(since_days(days))?;
    match export::export_sessions(&config.log_dir_path(), &sessions, format, Local::now())? {
        Some(path) => println!("Exported {} sessions to {}", sessions.len(), path.display()),
        None => println!("No data to export"),
    }
    Ok(())
}
