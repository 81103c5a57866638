//! License records and their scope inside a module
//!
//! A license file applies to the directory that contains it and to every
//! directory nested beneath that one.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::module::{path, stdlib};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseMetadata {
    /// Detected license types, e.g. `["MIT"]`
    #[serde(default)]
    pub types: Vec<String>,
    /// Path of the license file relative to the module root
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(flatten)]
    pub metadata: LicenseMetadata,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contents: String,
}

impl License {
    /// Full import path of the directory this license was declared in.
    pub fn directory(&self, module_path: &str) -> String {
        let dir = path::dir(&self.metadata.file_path);
        if module_path == stdlib::MODULE_PATH {
            // Standard library paths are not prefixed by the module path.
            return path::join("", dir);
        }
        path::join(module_path, dir)
    }

    /// Reports whether this license covers `full_path`.
    pub fn applies_to(&self, full_path: &str, module_path: &str) -> bool {
        path::is_within(full_path, &self.directory(module_path))
    }
}

/// Licenses among `licenses` that cover `full_path`, in declaration order.
pub fn applicable<'a>(
    full_path: &'a str,
    module_path: &'a str,
    licenses: &'a [License],
) -> impl Iterator<Item = &'a License> + 'a {
    licenses
        .iter()
        .filter(move |license| license.applies_to(full_path, module_path))
}

/// Filters a module's licenses down to those covering `full_path`.
///
/// A path no license covers is reported as [`Error::NotFound`] rather than as
/// an empty list.
pub fn licenses_for_path(
    full_path: &str,
    module_path: &str,
    licenses: &[License],
) -> Result<Vec<License>> {
    let scoped: Vec<License> = applicable(full_path, module_path, licenses)
        .cloned()
        .collect();
    if scoped.is_empty() {
        return Err(Error::NotFound(format!(
            "path {} is missing from module {}",
            full_path, module_path
        )));
    }
    Ok(scoped)
}
