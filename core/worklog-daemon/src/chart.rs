//! Productivity trend chart for `worklog report`.
//!
//! A self-contained HTML page with one inline SVG: hours worked per day on
//! the left axis and average productivity score on the right axis (0-100).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::db::DailyStats;

pub const CHART_FILE_NAME: &str = "productivity_chart.html";

const WIDTH: f64 = 860.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 60.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 70.0;
const HOURS_COLOR: &str = "#1f77b4";
const SCORE_COLOR: &str = "#2ca02c";

/// One plotted day, oldest first.
#[derive(Debug, Clone, PartialEq)]
struct Point {
    date: String,
    hours: f64,
    score: f64,
}

/// Writes `<log_dir>/productivity_chart.html`; `None` when there is no data.
pub fn write_productivity_chart(
    log_dir: &Path,
    daily: &[DailyStats],
) -> Result<Option<PathBuf>, String> {
    let Some(html) = render_productivity_chart(daily) else {
        return Ok(None);
    };

    fs_err::create_dir_all(log_dir)
        .map_err(|err| format!("Failed to create chart directory: {}", err))?;
    let path = log_dir.join(CHART_FILE_NAME);
    fs_err::write(&path, html).map_err(|err| format!("Failed to write chart: {}", err))?;
    Ok(Some(path))
}

pub fn render_productivity_chart(daily: &[DailyStats]) -> Option<String> {
    if daily.is_empty() {
        return None;
    }

    let mut points: Vec<Point> = daily
        .iter()
        .map(|day| Point {
            date: day.date.clone(),
            hours: day.total_seconds / 3600.0,
            score: day.avg_productivity.clamp(0.0, 100.0),
        })
        .collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));

    let max_hours = points
        .iter()
        .map(|point| point.hours)
        .fold(0.0_f64, f64::max)
        .max(1.0)
        .ceil();

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="24" text-anchor="middle" font-size="18">Productivity Trends</text>"#,
        WIDTH / 2.0
    );
    write_axes(&mut svg, max_hours);
    write_date_labels(&mut svg, &points);
    write_series(
        &mut svg,
        &points,
        Series {
            name: "Hours Worked",
            color: HOURS_COLOR,
        },
        |point| hours_y(point.hours, max_hours),
        |point| format!("{:.1}h", point.hours),
    );
    write_series(
        &mut svg,
        &points,
        Series {
            name: "Productivity Score",
            color: SCORE_COLOR,
        },
        |point| score_y(point.score),
        |point| format!("{:.1}/100", point.score),
    );
    write_legend(&mut svg);
    svg.push_str("</svg>\n");

    Some(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Productivity Trends</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        svg
    ))
}

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn baseline() -> f64 {
    HEIGHT - MARGIN_BOTTOM
}

/// A single day sits in the middle of the plot.
fn x_at(index: usize, count: usize) -> f64 {
    if count <= 1 {
        return MARGIN_LEFT + plot_width() / 2.0;
    }
    MARGIN_LEFT + plot_width() * index as f64 / (count - 1) as f64
}

fn hours_y(hours: f64, max_hours: f64) -> f64 {
    baseline() - plot_height() * (hours / max_hours)
}

fn score_y(score: f64) -> f64 {
    baseline() - plot_height() * (score / 100.0)
}

fn write_axes(svg: &mut String, max_hours: f64) {
    let right = WIDTH - MARGIN_RIGHT;
    let _ = writeln!(
        svg,
        r##"<g stroke="#999" fill="none"><line x1="{l}" y1="{t}" x2="{l}" y2="{b}"/><line x1="{r}" y1="{t}" x2="{r}" y2="{b}"/><line x1="{l}" y1="{b}" x2="{r}" y2="{b}"/></g>"##,
        l = MARGIN_LEFT,
        r = right,
        t = MARGIN_TOP,
        b = baseline()
    );

    for step in 0..=4 {
        let fraction = step as f64 / 4.0;
        let y = baseline() - plot_height() * fraction;
        let _ = writeln!(
            svg,
            r##"<line x1="{l}" y1="{y:.1}" x2="{r}" y2="{y:.1}" stroke="#eee"/><text x="{lx}" y="{ty:.1}" text-anchor="end" fill="{hc}">{hours:.1}</text><text x="{rx}" y="{ty:.1}" fill="{sc}">{score:.0}</text>"##,
            l = MARGIN_LEFT,
            r = right,
            y = y,
            lx = MARGIN_LEFT - 6.0,
            rx = right + 6.0,
            ty = y + 4.0,
            hc = HOURS_COLOR,
            sc = SCORE_COLOR,
            hours = max_hours * fraction,
            score = 100.0 * fraction
        );
    }

    let _ = writeln!(
        svg,
        r#"<text transform="translate(16 {y}) rotate(-90)" text-anchor="middle" fill="{hc}">Hours Worked</text><text transform="translate({x} {y}) rotate(90)" text-anchor="middle" fill="{sc}">Productivity Score</text>"#,
        y = MARGIN_TOP + plot_height() / 2.0,
        x = WIDTH - 16.0,
        hc = HOURS_COLOR,
        sc = SCORE_COLOR
    );
}

fn write_date_labels(svg: &mut String, points: &[Point]) {
    // Thin the labels so roughly a dozen fit along the axis.
    let every = points.len().div_ceil(12).max(1);
    for (index, point) in points.iter().enumerate() {
        if index % every != 0 && index + 1 != points.len() {
            continue;
        }
        let x = x_at(index, points.len());
        let y = baseline() + 18.0;
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" transform="rotate(-35 {x:.1} {y:.1})">{}</text>"#,
            escape_xml(&point.date)
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle">Date</text>"#,
        MARGIN_LEFT + plot_width() / 2.0,
        HEIGHT - 8.0
    );
}

struct Series {
    name: &'static str,
    color: &'static str,
}

fn write_series(
    svg: &mut String,
    points: &[Point],
    series: Series,
    y_of: impl Fn(&Point) -> f64,
    label_of: impl Fn(&Point) -> String,
) {
    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(index, point)| (x_at(index, points.len()), y_of(point)))
        .collect();

    let path = coords
        .iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(
        svg,
        r#"<polyline data-series="{}" fill="none" stroke="{}" stroke-width="2" points="{}"/>"#,
        series.name,
        series.color,
        path
    );

    for ((x, y), point) in coords.iter().zip(points) {
        let _ = writeln!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="3.5" fill="{}"><title>{} {}: {}</title></circle>"#,
            x,
            y,
            series.color,
            escape_xml(&point.date),
            series.name,
            label_of(point)
        );
    }
}

fn write_legend(svg: &mut String) {
    let x = MARGIN_LEFT + 10.0;
    let y = MARGIN_TOP - 14.0;
    let _ = writeln!(
        svg,
        r#"<g><rect x="{x}" y="{ry}" width="12" height="3" fill="{hc}"/><text x="{tx}" y="{y}">Hours Worked</text><rect x="{x2}" y="{ry}" width="12" height="3" fill="{sc}"/><text x="{tx2}" y="{y}">Productivity Score</text></g>"#,
        x = x,
        ry = y - 5.0,
        y = y,
        tx = x + 18.0,
        x2 = x + 130.0,
        tx2 = x + 148.0,
        hc = HOURS_COLOR,
        sc = SCORE_COLOR
    );
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
