//! Records describing module versions and the units inside them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::module::license::{License, LicenseMetadata};

/// Identity and metadata of one module version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub module_path: String,
    pub version: String,
    pub commit_time: DateTime<Utc>,
    #[serde(default)]
    pub is_redistributable: bool,
}

/// One directory inside a module, package or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitMeta {
    pub path: String,
    /// Package name; empty for directories that are not packages
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub is_redistributable: bool,
}

impl UnitMeta {
    pub fn is_package(&self) -> bool {
        !self.name.is_empty()
    }
}

/// A module version together with everything declared inside it
///
/// This is also the manifest format accepted by the index and served by the
/// proxy's `.manifest` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(flatten)]
    pub info: ModuleInfo,
    #[serde(default)]
    pub units: Vec<UnitMeta>,
    #[serde(default)]
    pub licenses: Vec<License>,
}

/// A single directory or package inside a specific module version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    pub path: String,
    pub module_path: String,
    pub version: String,
    pub name: String,
    pub is_redistributable: bool,
}

/// Listing-level metadata of one package in a module version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMeta {
    pub path: String,
    pub name: String,
    pub synopsis: String,
    pub is_redistributable: bool,
    pub licenses: Vec<LicenseMetadata>,
}

/// Version and commit time as reported by a module proxy `.info` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    pub version: String,
    pub time: DateTime<Utc>,
}
