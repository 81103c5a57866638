//! Module data model and the pure rules that operate on it
//!
//! # Modules
//!
//! - [`types`]: `ModuleInfo`, `Module`, `UnitMeta`, `PathInfo`, `PackageMeta`, `VersionInfo`
//! - [`license`]: license records and directory-prefix license scoping
//! - [`path`]: import path algebra (suffixes, candidate module paths, names)
//! - [`stdlib`]: the standard-library pseudo-module
//! - [`version`]: version parsing, display and latest selection

pub mod license;
pub mod path;
pub mod stdlib;
pub mod types;
pub mod version;

pub use license::{License, LicenseMetadata};
pub use types::{Module, ModuleInfo, PackageMeta, PathInfo, UnitMeta, VersionInfo};
