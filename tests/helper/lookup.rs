//! Latest-version lookups with canned answers

use std::sync::Mutex;

use async_trait::async_trait;

use pkgdoc::latest::LatestVersionLookup;

/// Answers every lookup with the same version and records each call
pub struct StaticLatest {
    latest: String,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl StaticLatest {
    pub fn new(latest: &str) -> Self {
        Self {
            latest: latest.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(path, module_path, page_type)` of every lookup so far
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LatestVersionLookup for StaticLatest {
    async fn latest(&self, path: &str, module_path: &str, page_type: &str) -> String {
        self.calls.lock().unwrap().push((
            path.to_string(),
            module_path.to_string(),
            page_type.to_string(),
        ));
        self.latest.clone()
    }
}
