//! Slash-separated import path algebra

use crate::module::stdlib;

/// Returns `full` relative to `prefix`.
///
/// - equal paths yield `""`
/// - an empty prefix yields `full` unchanged
/// - otherwise `prefix/` is stripped from the front of `full`
pub fn suffix<'a>(full: &'a str, prefix: &str) -> &'a str {
    if full == prefix {
        return "";
    }
    if prefix.is_empty() {
        return full;
    }
    full.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(full)
}

/// Reports whether `path` equals `dir` or is nested beneath it.
pub fn is_within(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        return true;
    }
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Directory containing `file_path`, or `"."` for a file at the root.
pub fn dir(file_path: &str) -> &str {
    match file_path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((dir, _)) => dir,
        None => ".",
    }
}

/// Joins two path fragments, treating `"."` and `""` as "no element".
pub fn join(base: &str, elem: &str) -> String {
    let elem = elem.trim_matches('/');
    match (base, elem) {
        (_, "" | ".") => base.to_string(),
        ("" | ".", _) => elem.to_string(),
        _ => format!("{}/{}", base.trim_end_matches('/'), elem),
    }
}

/// Reports whether `path` is a well-formed import path: non-empty, no leading
/// or trailing slash, no empty or dot elements, no `@`.
pub fn is_valid(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('@')
        && path
            .split('/')
            .all(|elem| !elem.is_empty() && elem != "." && elem != "..")
}

/// Module paths that could contain `path`, longest first.
///
/// Standard library paths only ever belong to [`stdlib::MODULE_PATH`].
pub fn candidate_module_paths(path: &str) -> Vec<String> {
    if path == stdlib::MODULE_PATH {
        return vec![stdlib::MODULE_PATH.to_string()];
    }
    if !is_valid(path) {
        return Vec::new();
    }
    if stdlib::contains(path) {
        return vec![stdlib::MODULE_PATH.to_string()];
    }

    let mut candidates = Vec::new();
    let mut current = path;
    loop {
        candidates.push(current.to_string());
        match current.rsplit_once('/') {
            Some((parent, _)) => current = parent,
            None => break,
        }
    }
    candidates
}

/// Removes a trailing major-version element (`/v2`, `/v3`, ...) or a
/// gopkg.in style `.vN` suffix.
pub fn strip_major_version(path: &str) -> &str {
    if let Some((prefix, last)) = path.rsplit_once('/') {
        if is_major_version(last.strip_prefix('v')) {
            return prefix;
        }
    }
    if path.starts_with("gopkg.in/") {
        if let Some((prefix, last)) = path.rsplit_once('.') {
            if is_major_version(last.strip_prefix('v')) {
                return prefix;
            }
        }
    }
    path
}

fn is_major_version(digits: Option<&str>) -> bool {
    digits.is_some_and(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()))
}

/// Name shown for a package: its declared name, or for commands and unnamed
/// directories the last element of its unversioned path.
pub fn effective_name(path: &str, name: &str) -> String {
    if !name.is_empty() && name != "main" {
        return name.to_string();
    }
    let base = strip_major_version(path);
    base.rsplit('/').next().unwrap_or(base).to_string()
}
