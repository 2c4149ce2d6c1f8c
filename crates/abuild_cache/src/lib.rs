//! The build cache: the single owner of every project, file, module and task
//! entity discovered in a C++ tree.
//!
//! [`BuildCache`] stores entities in arenas and hands out typed IDs;
//! [`BuildCacheIndex`] maps external keys (paths, names, entity keys) to those
//! IDs. [`CacheDocument`] is the persisted form that lets a later run skip
//! unchanged files, and [`Resolver`] answers dependency questions once the
//! cache is populated.

#![warn(missing_docs)]

pub mod change;
pub mod document;
pub mod entity;
pub mod error;
pub mod index;
pub mod resolver;
pub mod store;

pub use change::{detect_changes, ChangeSet};
pub use document::{CacheDocument, FileEntry, ModuleEntry, PartitionEntry, ProjectEntry};
pub use entity::{
    BuildTask, BuildTaskKind, Header, Module, ModulePartition, ModuleUnit, Project, Source,
};
pub use error::CacheError;
pub use index::BuildCacheIndex;
pub use resolver::{plan_build_tasks, Resolver};
pub use store::BuildCache;
