//! Request-side logic behind package, module and directory pages
//!
//! - [`resolver`] turns a `(path, module path, version)` request into concrete
//!   identities and license sets
//! - [`directory`] assembles directory listings
//! - [`url`] builds canonical page URLs
//! - [`view`] holds the records handed to page templates

pub mod directory;
pub mod resolver;
pub mod url;
pub mod view;

pub use directory::{Directory, DirectoryHeader, create_directory, fetch_directory_details};
pub use resolver::{resolve_licenses, resolve_path_info};
pub use url::{directory_url, module_url, package_url};
pub use view::{ModuleView, Package};
