//! Resolution of `(path, module path, version)` requests

use tracing::debug;

use crate::config::UNKNOWN_MODULE_PATH;
use crate::datasource::DataSource;
use crate::error::{Error, Result, ResultExt};
use crate::module::license::{self, License};
use crate::module::PathInfo;

/// Resolves a request into a concrete [`PathInfo`].
///
/// When `module_path` is [`UNKNOWN_MODULE_PATH`] the containing module is
/// discovered through [`DataSource::find_module`], and the version it reports
/// replaces `version`. The returned record always carries a concrete module
/// path and version; `name` and `is_redistributable` stay empty when no unit
/// of the module sits at `path`.
pub async fn resolve_path_info<D: DataSource + ?Sized>(
    ds: &D,
    path: &str,
    module_path: &str,
    version: &str,
) -> Result<PathInfo> {
    let resolve = async {
        let (module_path, version) = if module_path == UNKNOWN_MODULE_PATH {
            let (found, info) = ds.find_module(path, version).await?;
            debug!("Discovered module {}@{} for {}", found, info.version, path);
            (found, info.version)
        } else {
            (module_path.to_string(), version.to_string())
        };

        let module = ds.get_module(&module_path, &version).await?;

        let mut info = PathInfo {
            path: path.to_string(),
            module_path: module.info.module_path.clone(),
            version: module.info.version.clone(),
            ..Default::default()
        };
        if let Some(unit) = module.units.iter().find(|u| u.path == path) {
            info.name = unit.name.clone();
            info.is_redistributable = unit.is_redistributable;
        }
        Ok::<_, Error>(info)
    };
    resolve
        .await
        .context(|| format!("resolve_path_info({:?}, {:?}, {:?})", path, module_path, version))
}

/// Licenses of a module version that cover `full_path`.
///
/// Fails with NotFound when the module declares no license covering the path.
pub async fn resolve_licenses<D: DataSource + ?Sized>(
    ds: &D,
    full_path: &str,
    module_path: &str,
    version: &str,
) -> Result<Vec<License>> {
    let resolve = async {
        let module = ds.get_module(module_path, version).await?;
        license::licenses_for_path(full_path, &module.info.module_path, &module.licenses)
    };
    resolve.await.context(|| {
        format!(
            "resolve_licenses({:?}, {:?}, {:?})",
            full_path, module_path, version
        )
    })
}
