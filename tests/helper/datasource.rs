//! In-memory data source

use async_trait::async_trait;

use pkgdoc::config::{LATEST_VERSION, PAGE_TYPE_MODULE};
use pkgdoc::datasource::DataSource;
use pkgdoc::error::{Error, Result};
use pkgdoc::module::path::{candidate_module_paths, is_within};
use pkgdoc::module::{Module, PackageMeta, VersionInfo, license, stdlib, version};

/// Serves a fixed set of modules from memory
///
/// With listings disabled it behaves like a proxy-backed source and reports
/// package listings as unsupported.
pub struct FakeDataSource {
    modules: Vec<Module>,
    listings: bool,
}

impl FakeDataSource {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            listings: true,
        }
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn without_listings(mut self) -> Self {
        self.listings = false;
        self
    }

    fn versions_of(&self, module_path: &str) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|m| m.info.module_path == module_path)
            .collect()
    }

    fn lookup(&self, module_path: &str, version: &str) -> Result<&Module> {
        let candidates = self.versions_of(module_path);
        let resolved = if version == LATEST_VERSION {
            version::latest_of(candidates.iter().map(|m| m.info.version.as_str()))
        } else {
            Some(version.to_string())
        };
        resolved
            .and_then(|v| candidates.into_iter().find(|m| m.info.version == v))
            .ok_or_else(|| Error::NotFound(format!("{}@{}", module_path, version)))
    }
}

#[async_trait]
impl DataSource for FakeDataSource {
    async fn get_module(&self, module_path: &str, version: &str) -> Result<Module> {
        self.lookup(module_path, version).cloned()
    }

    async fn find_module(&self, path: &str, version: &str) -> Result<(String, VersionInfo)> {
        for module_path in candidate_module_paths(path) {
            let Ok(module) = self.lookup(&module_path, version) else {
                continue;
            };
            if module_path == path || module.units.iter().any(|u| u.path == path) {
                return Ok((
                    module_path,
                    VersionInfo {
                        version: module.info.version.clone(),
                        time: module.info.commit_time,
                    },
                ));
            }
        }
        Err(Error::NotFound(format!("no module contains {}", path)))
    }

    async fn get_packages_in_unit(
        &self,
        path: &str,
        module_path: &str,
        version: &str,
    ) -> Result<Vec<PackageMeta>> {
        if !self.listings {
            return Err(Error::Unsupported("package listings".to_string()));
        }
        let module = self.lookup(module_path, version)?;
        let whole_module = path == module_path || path == stdlib::MODULE_PATH;
        let packages: Vec<PackageMeta> = module
            .units
            .iter()
            .filter(|u| u.is_package() && (whole_module || is_within(&u.path, path)))
            .map(|u| PackageMeta {
                path: u.path.clone(),
                name: u.name.clone(),
                synopsis: u.synopsis.clone(),
                is_redistributable: u.is_redistributable,
                licenses: license::applicable(&u.path, module_path, &module.licenses)
                    .map(|l| l.metadata.clone())
                    .collect(),
            })
            .collect();
        if packages.is_empty() {
            return Err(Error::NotFound(format!("no packages beneath {}", path)));
        }
        Ok(packages)
    }

    async fn get_latest_version(
        &self,
        path: &str,
        module_path: &str,
        page_type: &str,
    ) -> Result<Option<String>> {
        let versions = self
            .versions_of(module_path)
            .into_iter()
            .filter(|m| {
                page_type == PAGE_TYPE_MODULE
                    || path.is_empty()
                    || path == module_path
                    || m.units.iter().any(|u| u.path == path)
            })
            .map(|m| m.info.version.as_str());
        Ok(version::latest_of(versions))
    }
}
