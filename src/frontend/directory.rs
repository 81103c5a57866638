//! Directory listings assembled from a module's packages

use serde::Serialize;
use tracing::debug;

use crate::datasource::DataSource;
use crate::error::{Error, Result, ResultExt};
use crate::frontend::url::directory_url;
use crate::frontend::view::{ModuleView, Package, create_module, create_package, url_version};
use crate::module::path::{effective_name, suffix};
use crate::module::{LicenseMetadata, ModuleInfo, PackageMeta, stdlib};

/// Header of a directory page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryHeader {
    #[serde(flatten)]
    pub module: ModuleView,
    pub path: String,
    pub url: String,
}

/// A directory and the packages found at or beneath it, ordered by path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    #[serde(flatten)]
    pub header: DirectoryHeader,
    pub packages: Vec<Package>,
}

/// Header for `dir_path`. When the reader asked for the latest version the
/// links carry no version, so they keep pointing at whatever is latest.
pub fn create_directory_header(
    dir_path: &str,
    mi: &ModuleInfo,
    licenses: &[LicenseMetadata],
    latest_requested: bool,
) -> Result<DirectoryHeader> {
    Ok(DirectoryHeader {
        module: create_module(mi, licenses, latest_requested),
        path: dir_path.to_string(),
        url: directory_url(dir_path, &mi.module_path, &url_version(mi, latest_requested))?,
    })
}

/// `include_dir_path` lists the directory's own package, which only makes
/// sense at a module or standard library root.
fn check_include_dir_path(dir_path: &str, module_path: &str, include_dir_path: bool) -> Result<()> {
    if include_dir_path && dir_path != module_path && dir_path != stdlib::MODULE_PATH {
        return Err(Error::InvalidArgument(format!(
            "include_dir_path can only be set when {} is the module path {}",
            dir_path, module_path
        )));
    }
    Ok(())
}

/// Builds a [`Directory`] for `dir_path` from the packages of one module
/// version.
///
/// `include_dir_path` controls whether a package whose path equals `dir_path`
/// is listed. A module's package list shows every package including the one
/// at the module root; a subdirectory listing does not list the directory
/// itself. `latest_requested` drops the version from every link.
pub fn create_directory(
    dir_path: &str,
    mi: &ModuleInfo,
    pkg_metas: &[PackageMeta],
    licenses: &[LicenseMetadata],
    include_dir_path: bool,
    latest_requested: bool,
) -> Result<Directory> {
    check_include_dir_path(dir_path, &mi.module_path, include_dir_path)?;

    let mut packages = Vec::with_capacity(pkg_metas.len());
    for pm in pkg_metas {
        if !include_dir_path && pm.path == dir_path {
            continue;
        }
        let mut pkg = create_package(pm, mi, latest_requested)?;
        pkg.path_after_directory = suffix(&pm.path, dir_path).to_string();
        if pkg.path_after_directory.is_empty() {
            pkg.path_after_directory = format!("{} (root)", effective_name(&pm.path, &pm.name));
        }
        packages.push(pkg);
    }
    packages.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(Directory {
        header: create_directory_header(dir_path, mi, licenses, latest_requested)?,
        packages,
    })
}

/// Fetches the packages at or beneath `dir_path` and assembles the listing.
///
/// A directory with no packages yields a header-only listing. Data sources
/// without package listings fail with [`Error::Unsupported`].
pub async fn fetch_directory_details<D: DataSource + ?Sized>(
    ds: &D,
    dir_path: &str,
    mi: &ModuleInfo,
    licenses: &[LicenseMetadata],
    include_dir_path: bool,
    latest_requested: bool,
) -> Result<Directory> {
    let fetch = async {
        check_include_dir_path(dir_path, &mi.module_path, include_dir_path)?;

        match ds
            .get_packages_in_unit(dir_path, &mi.module_path, &mi.version)
            .await
        {
            Ok(packages) => create_directory(
                dir_path,
                mi,
                &packages,
                licenses,
                include_dir_path,
                latest_requested,
            ),
            Err(e) if e.is_not_found() => {
                debug!("No packages beneath {}: {}", dir_path, e);
                Ok(Directory {
                    header: create_directory_header(dir_path, mi, licenses, latest_requested)?,
                    packages: Vec::new(),
                })
            }
            Err(e) => Err(e),
        }
    };
    fetch.await.context(|| {
        format!(
            "fetch_directory_details({:?}, {:?}, {:?}, {})",
            dir_path, mi.module_path, mi.version, include_dir_path
        )
    })
}
