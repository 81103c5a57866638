//! Module records and index setup

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use pkgdoc::datasource::IndexDataSource;
use pkgdoc::module::{License, LicenseMetadata, Module, ModuleInfo, UnitMeta};

/// A unit at `path`; an empty `name` makes it a plain directory
pub fn unit(path: &str, name: &str) -> UnitMeta {
    UnitMeta {
        path: path.to_string(),
        name: name.to_string(),
        synopsis: if name.is_empty() {
            String::new()
        } else {
            format!("Package {} does things.", name)
        },
        is_redistributable: true,
    }
}

pub fn license(file_path: &str, kind: &str) -> License {
    License {
        metadata: LicenseMetadata {
            types: vec![kind.to_string()],
            file_path: file_path.to_string(),
        },
        contents: format!("{} license text", kind),
    }
}

pub fn module(module_path: &str, version: &str, units: Vec<UnitMeta>, licenses: Vec<License>) -> Module {
    Module {
        info: ModuleInfo {
            module_path: module_path.to_string(),
            version: version.to_string(),
            commit_time: Utc.with_ymd_and_hms(2020, 7, 14, 12, 0, 0).unwrap(),
            is_redistributable: true,
        },
        units,
        licenses,
    }
}

/// Opens an index in a fresh temporary directory and stores `modules` in it.
/// Keep the returned `TempDir` alive for as long as the index is used.
pub fn create_test_index(modules: &[Module]) -> (TempDir, IndexDataSource) {
    let temp_dir = TempDir::new().unwrap();
    let index = IndexDataSource::new(&temp_dir.path().join("index.db")).unwrap();
    for module in modules {
        index.insert_module(module).unwrap();
    }
    (temp_dir, index)
}
