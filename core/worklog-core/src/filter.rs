//! Change-event filtering.
//!
//! Drops events that never represent developer work: directories, VCS
//! internals, dependency/cache trees, editor state and scratch files.
//! Matching is per path component, so `.gitignore` is tracked while
//! anything under `.git/` is not.

use std::path::{Component, Path};

/// Directories whose contents are never tracked.
pub const IGNORED_DIRECTORIES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    "target",
    ".cache",
    ".vscode",
    ".idea",
];

/// File suffixes for compiled, log, temp and editor swap files.
pub const IGNORED_SUFFIXES: &[&str] = &[".pyc", ".log", ".tmp", ".swp", ".swo", "~"];

/// OS metadata files.
pub const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

pub fn should_track(path: &Path, is_directory: bool) -> bool {
    if is_directory {
        return false;
    }

    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    if IGNORED_FILE_NAMES.contains(&file_name) {
        return false;
    }

    if IGNORED_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
    {
        return false;
    }

    !path.components().any(|component| match component {
        Component::Normal(part) => part
            .to_str()
            .map(|part| IGNORED_DIRECTORIES.contains(&part))
            .unwrap_or(false),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_regular_source_files() {
        assert!(should_track(Path::new("/code/app/src/main.rs"), false));
        assert!(should_track(Path::new("/code/app/.gitignore"), false));
        assert!(should_track(Path::new("/code/app/README"), false));
    }

    #[test]
    fn ignores_directory_events() {
        assert!(!should_track(Path::new("/code/app/src"), true));
    }

    #[test]
    fn ignores_vcs_and_dependency_trees() {
        assert!(!should_track(Path::new("/code/app/.git/index"), false));
        assert!(!should_track(
            Path::new("/code/app/node_modules/pkg/index.js"),
            false
        ));
        assert!(!should_track(
            Path::new("/code/app/pkg/__pycache__/mod.cpython-311.pyc"),
            false
        ));
        assert!(!should_track(Path::new("/code/app/.vscode/settings.json"), false));
    }

    #[test]
    fn ignores_scratch_and_metadata_files() {
        assert!(!should_track(Path::new("/code/app/module.pyc"), false));
        assert!(!should_track(Path::new("/code/app/server.log"), false));
        assert!(!should_track(Path::new("/code/app/upload.tmp"), false));
        assert!(!should_track(Path::new("/code/app/.main.rs.swp"), false));
        assert!(!should_track(Path::new("/code/app/notes.txt~"), false));
        assert!(!should_track(Path::new("/code/app/.DS_Store"), false));
    }

    #[test]
    fn fragment_inside_file_name_is_not_a_directory_match() {
        assert!(should_track(Path::new("/code/app/targeting.rs"), false));
        assert!(should_track(Path::new("/code/app/my.git.notes.md"), false));
    }
}
