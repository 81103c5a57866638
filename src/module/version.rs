//! Module version helpers
//!
//! Module versions are semantic versions with a mandatory `v` prefix:
//! - Release: v1.2.3
//! - Pre-release: v1.3.0-rc.1
//! - Pseudo-version: v0.0.0-20210101000000-abcdef123456

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::module::stdlib;

static PSEUDO_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v[0-9]+\.(?:0\.0-|\d+\.\d+-(?:[^+]*\.)?0\.)\d{14}-[A-Za-z0-9]+(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$")
        .expect("pseudo-version pattern is valid")
});

/// Reports whether `version` is a pseudo-version naming an untagged commit.
pub fn is_pseudo_version(version: &str) -> bool {
    version.matches('-').count() >= 2 && PSEUDO_VERSION.is_match(version)
}

/// Parses a `v`-prefixed module version.
pub fn parse(version: &str) -> Option<Version> {
    Version::parse(version.strip_prefix('v')?).ok()
}

/// Version string used when building links to a module version.
pub fn link_version(version: &str, module_path: &str) -> String {
    if module_path == stdlib::MODULE_PATH {
        if version.starts_with('v') {
            return stdlib::version_for_tag(version);
        }
        return version.to_string();
    }
    version.to_string()
}

/// Version string shown to readers. Pseudo-versions are shortened to their
/// base and the first seven characters of the commit.
pub fn display_version(version: &str, module_path: &str) -> String {
    if module_path == stdlib::MODULE_PATH {
        return link_version(version, module_path);
    }
    if !is_pseudo_version(version) {
        return version.to_string();
    }
    let version = version.split('+').next().unwrap_or(version);
    let Some((base, commit)) = version.rsplit_once('-') else {
        return version.to_string();
    };
    let base = base.split('-').next().unwrap_or(base);
    let commit: String = commit.chars().take(7).collect();
    format!("{}-...-{}", base, commit)
}

/// Picks the latest version: the highest release, or the highest pre-release
/// when no release exists. Unparseable versions are skipped.
pub fn latest_of<I, S>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed: Vec<(String, Version)> = versions
        .into_iter()
        .filter_map(|v| {
            let v = v.as_ref();
            parse(v).map(|parsed| (v.to_string(), parsed))
        })
        .collect();

    let best = |candidates: Vec<&(String, Version)>| {
        candidates
            .into_iter()
            .max_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(original, _)| original.clone())
    };

    best(parsed.iter().filter(|(_, v)| v.pre.is_empty()).collect())
        .or_else(|| best(parsed.iter().collect()))
}
