//! Commit message → short task name.
//!
//! Rules are tried in order and the first one that yields a non-empty
//! description wins. A message like `[ABC-1] fix: thing` matches the tracker
//! rule before the tag rule, so the order here is part of the contract.

use once_cell::sync::Lazy;
use regex::Regex;

pub const UNKNOWN_TASK: &str = "Unknown Task";
pub const TASK_NAME_MAX_LEN: usize = 50;
const FALLBACK_WORDS: usize = 3;
const ELLIPSIS: &str = "...";

// ═══════════════════════════════════════════════════════════════════════════════
// Commit Message Regexes
// ═══════════════════════════════════════════════════════════════════════════════

/// `PROJ-123: desc`, `[FEAT-456] desc`
pub static RE_TRACKER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[?[A-Z][A-Z0-9]+-\d+\]?\s*:?\s*(.+)$").unwrap());
/// `closes #42: desc`, `fixes #7 desc`, `#12: desc`
pub static RE_ISSUE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+)?#\d+\s*:?\s*(.+)$").unwrap()
});
/// `[ui] desc`
pub static RE_BRACKET_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[^\]]+\]\s*:?\s*(.+)$").unwrap());
/// `feat: desc`, `fix(parser)!: desc`
pub static RE_CONVENTIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:feat|feature|fix|bug|bugfix|hotfix|chore|docs|style|refactor|perf|test|tests|build|ci|revert|wip)(?:\([^)]*\))?!?\s*:\s*(.+)$",
    )
    .unwrap()
});
/// `Add thing`, `Implement thing` - the verb stays part of the task name.
pub static RE_IMPERATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^((?:add|implement|create|update|fix|remove|delete|refactor|improve|introduce|support|enable|disable|rename|move|replace|clean|optimize|upgrade|bump|migrate|write|handle|allow|make|use|build|set)\b.*)$",
    )
    .unwrap()
});

pub fn extract_task_name(message: &str) -> String {
    let line = match message.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) => line,
        None => return UNKNOWN_TASK.to_string(),
    };

    let rules: [&Regex; 5] = [
        &RE_TRACKER_ID,
        &RE_ISSUE_REF,
        &RE_BRACKET_TAG,
        &RE_CONVENTIONAL,
        &RE_IMPERATIVE,
    ];
    for rule in rules {
        let Some(captures) = rule.captures(line) else {
            continue;
        };
        let Some(description) = captures.get(1) else {
            continue;
        };
        let normalized = normalize(description.as_str());
        if !normalized.is_empty() {
            return truncate(&normalized);
        }
    }

    let leading = line
        .split_whitespace()
        .take(FALLBACK_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    let normalized = normalize(&leading);
    if normalized.is_empty() {
        return UNKNOWN_TASK.to_string();
    }
    truncate(&normalized)
}

fn normalize(raw: &str) -> String {
    raw.replace(['_', '-'], " ")
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    if word.chars().count() == 1 || is_acronym(word) {
        return word.to_string();
    }

    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn is_acronym(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
        && word
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= TASK_NAME_MAX_LEN {
        return value.to_string();
    }
    let keep = TASK_NAME_MAX_LEN - ELLIPSIS.len();
    let mut truncated: String = value.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);
    truncated
}
