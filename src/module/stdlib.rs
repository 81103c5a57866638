//! Rules for the standard-library pseudo-module

/// Reserved module path of the standard library
pub const MODULE_PATH: &str = "std";

/// Reports whether `path` names a standard library package. Standard library
/// import paths have no dot in their first element.
pub fn contains(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or(path);
    !first.is_empty() && !first.contains('.')
}

/// Converts a semantic version to the release tag it was published under.
///
/// - `v1.14.0` -> `go1.14`
/// - `v1.14.6` -> `go1.14.6`
/// - `v1.21.0` -> `go1.21.0` (from 1.21 the patch is always kept)
/// - `v1.15.0-beta.1` -> `go1.15beta1`
///
/// Anything that does not look like a release version is returned unchanged.
pub fn version_for_tag(version: &str) -> String {
    let Some(rest) = version.strip_prefix('v') else {
        return version.to_string();
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    let [major, minor, patch] = parts.as_slice() else {
        return version.to_string();
    };
    let (Ok(_), Ok(minor_num), Ok(_)) = (
        major.parse::<u64>(),
        minor.parse::<u64>(),
        patch.parse::<u64>(),
    ) else {
        return version.to_string();
    };

    let mut tag = format!("go{}.{}", major, minor);
    if let Some(pre) = pre {
        // beta.1 -> beta1, rc.2 -> rc2
        tag.push_str(&pre.replace('.', ""));
        return tag;
    }
    if *patch != "0" || minor_num >= 21 {
        tag.push('.');
        tag.push_str(patch);
    }
    tag
}
