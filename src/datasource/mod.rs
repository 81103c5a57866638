//! Data sources backing page requests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │   frontend   │────▶│  DataSource  │
//! │  (resolver,  │     │   (trait)    │
//! │  directory)  │     └──────────────┘
//! └──────────────┘        ▲        ▲
//!                         │        │
//!          ┌──────────────┴─┐    ┌─┴──────────────┐
//!          │ProxyDataSource │    │IndexDataSource │
//!          │ (ModuleProxy)  │    │   (SQLite)     │
//!          └────────────────┘    └────────────────┘
//! ```
//!
//! The proxy-backed source serves module, license and path lookups only;
//! package listings fail with [`Error::Unsupported`](crate::error::Error::Unsupported).

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::module::{Module, ModuleInfo, PackageMeta, VersionInfo};

pub mod index;
pub mod proxy;

pub use index::IndexDataSource;
pub use proxy::ProxyDataSource;

/// Capability interface over stored or upstream module data
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches the full record of a module version, including its units and
    /// every license declared in it. `version` may be the latest sentinel.
    async fn get_module(&self, module_path: &str, version: &str) -> Result<Module>;

    /// Fetches identity and metadata of a module version
    async fn get_module_info(&self, module_path: &str, version: &str) -> Result<ModuleInfo> {
        Ok(self.get_module(module_path, version).await?.info)
    }

    /// Discovers which module contains `path` at `version`
    ///
    /// # Returns
    /// * `Ok((module_path, info))` - The longest module path that contains `path`
    /// * `Err(Error)` - NotFound when no candidate module has the version
    async fn find_module(&self, path: &str, version: &str) -> Result<(String, VersionInfo)>;

    /// Lists the packages at or beneath `path` in a module version
    async fn get_packages_in_unit(
        &self,
        path: &str,
        module_path: &str,
        version: &str,
    ) -> Result<Vec<PackageMeta>>;

    /// Latest known version for a page, `None` when it cannot be determined
    async fn get_latest_version(
        &self,
        path: &str,
        module_path: &str,
        page_type: &str,
    ) -> Result<Option<String>>;
}
