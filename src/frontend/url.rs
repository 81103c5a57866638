//! Canonical URLs for packages, directories and modules
//!
//! Every page type links through these builders, so the shapes below are the
//! only URL forms the site produces:
//! - `/<path>` when linking to the latest version
//! - `/<path>@<version>` for module roots and the standard library
//! - `/<module>@<version>/<suffix>` for directories inside a module

use crate::config::LATEST_VERSION;
use crate::error::{Error, Result};
use crate::module::stdlib;

/// URL of the directory `dir_path` in `module_path` at `link_version`.
///
/// Fails with [`Error::InvalidArgument`] when either path contains `@`, or
/// when a non-root directory does not live inside `module_path`.
pub fn directory_url(dir_path: &str, module_path: &str, link_version: &str) -> Result<String> {
    if dir_path.contains('@') || module_path.contains('@') {
        return Err(Error::InvalidArgument(format!(
            "path {:?} or module path {:?} contains '@'",
            dir_path, module_path
        )));
    }
    if link_version == LATEST_VERSION {
        return Ok(format!("/{}", dir_path));
    }
    if dir_path == module_path || module_path == stdlib::MODULE_PATH {
        return Ok(format!("/{}@{}", dir_path, link_version));
    }
    let Some(suffix) = dir_path
        .strip_prefix(module_path)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Err(Error::InvalidArgument(format!(
            "path {} is not inside module {}",
            dir_path, module_path
        )));
    };
    Ok(format!("/{}@{}/{}", module_path, link_version, suffix))
}

/// URL of a package page. Packages follow the directory rule.
pub fn package_url(pkg_path: &str, module_path: &str, link_version: &str) -> Result<String> {
    directory_url(pkg_path, module_path, link_version)
}

/// URL of a module page: `/mod/<module>[@<version>]`, without the `mod/`
/// segment for the standard library.
pub fn module_url(module_path: &str, link_version: &str) -> String {
    let mut url = String::from("/");
    if module_path != stdlib::MODULE_PATH {
        url.push_str("mod/");
    }
    url.push_str(module_path);
    if link_version != LATEST_VERSION {
        url.push('@');
        url.push_str(link_version);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("github.com/a/b", "github.com/a/b", LATEST_VERSION, "/github.com/a/b")]
    #[case("github.com/a/b/c", "github.com/a/b", LATEST_VERSION, "/github.com/a/b/c")]
    #[case("github.com/a/b", "github.com/a/b", "v1.2.3", "/github.com/a/b@v1.2.3")]
    #[case("github.com/a/b/c/d", "github.com/a/b", "v1.2.3", "/github.com/a/b@v1.2.3/c/d")]
    #[case("net/http", "std", "go1.14", "/net/http@go1.14")]
    #[case("std", "std", "go1.14", "/std@go1.14")]
    #[case("net/http", "std", LATEST_VERSION, "/net/http")]
    fn directory_url_returns_expected(
        #[case] dir_path: &str,
        #[case] module_path: &str,
        #[case] link_version: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            directory_url(dir_path, module_path, link_version).unwrap(),
            expected
        );
    }

    #[rstest]
    #[case("github.com/a/b", "github.com/a/b")]
    #[case("github.com/a/b/c", "github.com/a/b")]
    #[case("net/http", "std")]
    fn latest_urls_never_carry_a_version(#[case] dir_path: &str, #[case] module_path: &str) {
        let url = directory_url(dir_path, module_path, LATEST_VERSION).unwrap();
        assert!(!url.contains('@'));
        assert!(!url.contains(LATEST_VERSION));
    }

    #[rstest]
    #[case("github.com/x/y", "github.com/a/b")]
    #[case("github.com/a/bc", "github.com/a/b")]
    #[case("github.com/a/b@v1/c", "github.com/a/b")]
    #[case("github.com/a/b/c", "github.com/a@b")]
    fn directory_url_rejects_precondition_violations(
        #[case] dir_path: &str,
        #[case] module_path: &str,
    ) {
        let err = directory_url(dir_path, module_path, "v1.0.0").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[rstest]
    #[case("github.com/a/b", "v1.2.3", "/mod/github.com/a/b@v1.2.3")]
    #[case("github.com/a/b", LATEST_VERSION, "/mod/github.com/a/b")]
    #[case("std", "go1.14", "/std@go1.14")]
    #[case("std", LATEST_VERSION, "/std")]
    fn module_url_returns_expected(
        #[case] module_path: &str,
        #[case] link_version: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(module_url(module_path, link_version), expected);
    }
}
