//! Productivity score for a completed session.
//!
//! Three capped components add up to at most 100:
//! time (40, saturates at one hour), breadth (30, saturates at six files)
//! and volume (30, saturates at 300 changed lines).

const TIME_WEIGHT: f64 = 40.0;
const TIME_SATURATION_SECS: f64 = 3600.0;
const POINTS_PER_FILE: f64 = 5.0;
const FILE_CAP: f64 = 30.0;
const LINES_PER_POINT: f64 = 10.0;
const LINES_CAP: f64 = 30.0;

pub fn productivity_score(duration_secs: f64, files_changed: u64, lines_changed: u64) -> f64 {
    if duration_secs <= 0.0 || !duration_secs.is_finite() {
        return 0.0;
    }

    let time_score = (duration_secs / TIME_SATURATION_SECS).min(1.0) * TIME_WEIGHT;
    let file_score = (files_changed as f64 * POINTS_PER_FILE).min(FILE_CAP);
    let lines_score = (lines_changed as f64 / LINES_PER_POINT).min(LINES_CAP);

    time_score + file_score + lines_score
}
