//! Latest-version lookup used when annotating pages

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::warn;

use crate::datasource::DataSource;

/// Source of the latest version for a page
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait LatestVersionLookup: Send + Sync {
    /// Latest version of the page at `path` in `module_path`, or an empty
    /// string when it is unknown
    async fn latest(&self, path: &str, module_path: &str, page_type: &str) -> String;
}

/// [`LatestVersionLookup`] over any [`DataSource`]. Lookup failures are logged
/// and reported as unknown.
pub struct SourceLatest<D: DataSource + ?Sized> {
    source: Arc<D>,
}

impl<D: DataSource + ?Sized> SourceLatest<D> {
    pub fn new(source: Arc<D>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl<D: DataSource + ?Sized> LatestVersionLookup for SourceLatest<D> {
    async fn latest(&self, path: &str, module_path: &str, page_type: &str) -> String {
        match self
            .source
            .get_latest_version(path, module_path, page_type)
            .await
        {
            Ok(Some(version)) => version,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(
                    "Failed to look up latest version of {} in {}: {}",
                    path, module_path, e
                );
                String::new()
            }
        }
    }
}
