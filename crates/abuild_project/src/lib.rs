//! Discovery of C++ projects on disk and the incremental scan pipeline.
//!
//! [`ProjectScanner`] walks a tree, attributing every source and header to a
//! project by directory naming convention. [`scan`] combines that walk with
//! the persisted [`CacheDocument`](abuild_cache::CacheDocument) so that only
//! files whose modified time changed are tokenized again.

#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod pipeline;
pub mod project_name;
pub mod scanner;

pub use classify::{classify_directory, classify_file, DirectoryClass, FileClass, DIRECTORY_RULES};
pub use error::ProjectError;
pub use pipeline::{scan, scan_project, ScanOutcome, ScanReport};
pub use project_name::project_name;
pub use scanner::{DiscoveredFile, Discovery, ProjectScanner};
