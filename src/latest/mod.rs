//! Latest-version annotation of rendered pages
//!
//! ```text
//! render() ──▶ LatestAnnotator::annotate_page() ──▶ write_page()
//!                      │
//!                      ▼
//!          LatestVersionLookup::latest() ──▶ classify()
//! ```

pub mod annotator;
pub mod classifier;
pub mod lookup;

pub use annotator::{LatestAnnotator, RenderedPage, serve_page, write_page};
pub use classifier::{LatestClass, classify};
pub use lookup::{LatestVersionLookup, SourceLatest};
