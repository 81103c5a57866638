//! Upstream module proxy access

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::module::{Module, VersionInfo};

pub mod client;

pub use client::ProxyClient;

/// Trait for fetching module data from an upstream module proxy
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ModuleProxy: Send + Sync {
    /// Resolves `version` (which may be the latest sentinel) for a module
    ///
    /// # Returns
    /// * `Ok(VersionInfo)` - The concrete version and its commit time
    /// * `Err(Error)` - NotFound when the module or version does not exist
    async fn info(&self, module_path: &str, version: &str) -> Result<VersionInfo>;

    /// Fetches the full record of a concrete module version
    async fn module(&self, module_path: &str, version: &str) -> Result<Module>;

    /// Lists the tagged versions of a module, in the order the proxy returns them
    async fn list(&self, module_path: &str) -> Result<Vec<String>>;
}
