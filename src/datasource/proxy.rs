//! DataSource backed solely by a module proxy

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::config::LATEST_VERSION;
use crate::datasource::DataSource;
use crate::error::{Error, Result, ResultExt};
use crate::module::path::candidate_module_paths;
use crate::module::{Module, PackageMeta, VersionInfo, version};
use crate::proxy::ModuleProxy;

type ModuleKey = (String, String);

/// Serves module, license and path lookups straight from a [`ModuleProxy`].
///
/// Fetched module records are kept for the lifetime of the data source, keyed
/// by the requested `(module_path, version)`.
pub struct ProxyDataSource<P: ModuleProxy> {
    proxy: P,
    modules: Mutex<HashMap<ModuleKey, Arc<Module>>>,
}

impl<P: ModuleProxy> ProxyDataSource<P> {
    pub fn new(proxy: P) -> Self {
        Self {
            proxy,
            modules: Mutex::new(HashMap::new()),
        }
    }

    fn lock_modules(&self) -> Result<MutexGuard<'_, HashMap<ModuleKey, Arc<Module>>>> {
        self.modules
            .lock()
            .map_err(|_| Error::Internal("module cache lock poisoned".to_string()))
    }

    /// Returns the module record for `(module_path, version)`, resolving the
    /// latest sentinel and fetching from the proxy on a miss.
    async fn fetch_module(&self, module_path: &str, version: &str) -> Result<Arc<Module>> {
        let key = (module_path.to_string(), version.to_string());
        if let Some(module) = self.lock_modules()?.get(&key) {
            return Ok(module.clone());
        }

        let resolved = if version == LATEST_VERSION {
            self.proxy.info(module_path, version).await?.version
        } else {
            version.to_string()
        };
        debug!("Fetching {}@{} from proxy", module_path, resolved);
        let module = Arc::new(self.proxy.module(module_path, &resolved).await?);

        let mut modules = self.lock_modules()?;
        modules.insert((module_path.to_string(), resolved), module.clone());
        modules.insert(key, module.clone());
        Ok(module)
    }
}

#[async_trait::async_trait]
impl<P: ModuleProxy> DataSource for ProxyDataSource<P> {
    async fn get_module(&self, module_path: &str, version: &str) -> Result<Module> {
        self.fetch_module(module_path, version)
            .await
            .map(|module| module.as_ref().clone())
            .context(|| format!("get_module({:?}, {:?})", module_path, version))
    }

    async fn find_module(&self, path: &str, version: &str) -> Result<(String, VersionInfo)> {
        for module_path in candidate_module_paths(path) {
            match self.proxy.info(&module_path, version).await {
                Ok(info) => return Ok((module_path, info)),
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    return Err(e.context(format!("find_module({:?}, {:?})", path, version)));
                }
            }
        }
        Err(Error::NotFound(format!(
            "unable to find module for {}@{}",
            path, version
        )))
    }

    async fn get_packages_in_unit(
        &self,
        path: &str,
        module_path: &str,
        version: &str,
    ) -> Result<Vec<PackageMeta>> {
        Err(Error::Unsupported(format!(
            "package listing for {} in {}@{} is not available from the module proxy",
            path, module_path, version
        )))
    }

    /// Highest tagged version from the version list, falling back to the
    /// proxy's `@latest` answer for modules without tags.
    async fn get_latest_version(
        &self,
        _path: &str,
        module_path: &str,
        _page_type: &str,
    ) -> Result<Option<String>> {
        let lookup = async {
            if let Some(latest) = version::latest_of(self.proxy.list(module_path).await?) {
                return Ok(Some(latest));
            }
            let info = self.proxy.info(module_path, LATEST_VERSION).await?;
            Ok::<_, Error>(Some(info.version))
        };
        match lookup.await {
            Err(e) if e.is_not_found() => {
                warn!("No latest version for {}: {}", module_path, e);
                Ok(None)
            }
            result => result.context(|| format!("get_latest_version({:?})", module_path)),
        }
    }
}
