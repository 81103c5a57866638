//! View records handed to page templates

use serde::Serialize;

use crate::config::LATEST_VERSION;
use crate::error::Result;
use crate::frontend::url::{module_url, package_url};
use crate::module::version::{display_version, link_version};
use crate::module::{LicenseMetadata, ModuleInfo, PackageMeta};

/// Module identity as shown in page headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    pub display_version: String,
    pub link_version: String,
    pub module_path: String,
    pub commit_time: String,
    pub is_redistributable: bool,
    pub licenses: Vec<LicenseMetadata>,
    pub url: String,
}

/// A package entry in a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub name: String,
    pub path: String,
    pub synopsis: String,
    pub is_redistributable: bool,
    pub licenses: Vec<LicenseMetadata>,
    pub module: ModuleView,
    pub url: String,
    /// Path relative to the enclosing directory, or `"<name> (root)"` for the
    /// directory's own package
    pub path_after_directory: String,
}

/// Version segment for links: the latest sentinel when the reader asked for
/// the latest version, otherwise the module's link version.
pub(crate) fn url_version(mi: &ModuleInfo, latest_requested: bool) -> String {
    if latest_requested {
        LATEST_VERSION.to_string()
    } else {
        link_version(&mi.version, &mi.module_path)
    }
}

/// Commit times read like "Jan 2, 2006".
fn absolute_time(mi: &ModuleInfo) -> String {
    mi.commit_time.format("%b %-d, %Y").to_string()
}

pub fn create_module(
    mi: &ModuleInfo,
    licenses: &[LicenseMetadata],
    latest_requested: bool,
) -> ModuleView {
    ModuleView {
        display_version: display_version(&mi.version, &mi.module_path),
        link_version: link_version(&mi.version, &mi.module_path),
        module_path: mi.module_path.clone(),
        commit_time: absolute_time(mi),
        is_redistributable: mi.is_redistributable,
        licenses: licenses.to_vec(),
        url: module_url(&mi.module_path, &url_version(mi, latest_requested)),
    }
}

/// Builds the listing entry for `pm`; `path_after_directory` is left empty
/// for the directory assembler to fill in.
pub fn create_package(
    pm: &PackageMeta,
    mi: &ModuleInfo,
    latest_requested: bool,
) -> Result<Package> {
    Ok(Package {
        name: pm.name.clone(),
        path: pm.path.clone(),
        synopsis: pm.synopsis.clone(),
        is_redistributable: pm.is_redistributable,
        licenses: pm.licenses.clone(),
        module: create_module(mi, &pm.licenses, latest_requested),
        url: package_url(&pm.path, &mi.module_path, &url_version(mi, latest_requested))?,
        path_after_directory: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn module_info(module_path: &str, version: &str) -> ModuleInfo {
        ModuleInfo {
            module_path: module_path.to_string(),
            version: version.to_string(),
            commit_time: Utc.with_ymd_and_hms(2019, 1, 30, 0, 0, 0).unwrap(),
            is_redistributable: true,
        }
    }

    fn package_meta(path: &str) -> PackageMeta {
        PackageMeta {
            path: path.to_string(),
            name: "c".to_string(),
            synopsis: "Package c does things.".to_string(),
            is_redistributable: true,
            licenses: vec![LicenseMetadata {
                types: vec!["MIT".to_string()],
                file_path: "LICENSE".to_string(),
            }],
        }
    }

    #[test]
    fn create_module_formats_header_fields() {
        let mi = module_info("github.com/a/b", "v0.0.0-20190311183353-d8887717615a");

        let module = create_module(&mi, &[], false);

        assert_eq!(module.display_version, "v0.0.0-...-d888771");
        assert_eq!(module.link_version, "v0.0.0-20190311183353-d8887717615a");
        assert_eq!(module.commit_time, "Jan 30, 2019");
        assert_eq!(
            module.url,
            "/mod/github.com/a/b@v0.0.0-20190311183353-d8887717615a"
        );
    }

    #[test]
    fn create_module_for_stdlib_uses_release_tags() {
        let mi = module_info("std", "v1.14.0");

        let module = create_module(&mi, &[], false);

        assert_eq!(module.display_version, "go1.14");
        assert_eq!(module.url, "/std@go1.14");
    }

    #[test]
    fn create_package_links_to_requested_version() {
        let mi = module_info("github.com/a/b", "v1.2.3");

        let pkg = create_package(&package_meta("github.com/a/b/c"), &mi, false).unwrap();

        assert_eq!(pkg.url, "/github.com/a/b@v1.2.3/c");
        assert_eq!(pkg.module.licenses, pkg.licenses);
        assert_eq!(pkg.path_after_directory, "");
    }

    #[test]
    fn create_package_links_to_latest_when_requested() {
        let mi = module_info("github.com/a/b", "v1.2.3");

        let pkg = create_package(&package_meta("github.com/a/b/c"), &mi, true).unwrap();

        assert_eq!(pkg.url, "/github.com/a/b/c");
        assert_eq!(pkg.module.url, "/mod/github.com/a/b");
    }

    #[test]
    fn create_package_rejects_package_outside_module() {
        let mi = module_info("github.com/a/b", "v1.2.3");

        let err = create_package(&package_meta("github.com/x/y"), &mi, false).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }
}
