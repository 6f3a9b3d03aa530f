//! Input-file discovery for the merge tools.
//!
//! Patterns support `*` and `?` wildcards in the final path component only;
//! earlier components are taken literally. Matches are returned in
//! lexicographic path order, which fixes the first-seen-wins processing
//! order of every merge.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::CuratorError;

pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, CuratorError> {
    let path = Path::new(pattern);
    let file_pattern = path
        .file_name()
        .and_then(|value| value.to_str())
        .ok_or_else(|| CuratorError::InvalidPattern(pattern.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if dir.to_string_lossy().contains(['*', '?']) {
        return Err(CuratorError::InvalidPattern(pattern.to_string()));
    }

    let matcher = wildcard_regex(file_pattern)?;
    let entries = fs::read_dir(&dir)
        .map_err(|err| CuratorError::Filesystem(format!("read {}: {err}", dir.display())))?;

    let mut matches = Vec::new();
    for entry in entries.flatten() {
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }
        let Some(name) = entry_path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if matcher.is_match(name) {
            matches.push(entry_path);
        }
    }
    matches.sort();
    tracing::debug!(pattern, matched = matches.len(), "expanded input pattern");
    Ok(matches)
}

fn wildcard_regex(pattern: &str) -> Result<Regex, CuratorError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|_| CuratorError::InvalidPattern(pattern.to_string()))
}
