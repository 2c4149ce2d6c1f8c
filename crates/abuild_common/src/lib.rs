//! Shared foundational types used across the abuild crates.
//!
//! This crate provides the dense [`Arena`] used by the build cache to own its
//! entities, the typed handles that refer to those entities, and the common
//! internal error type.

#![warn(missing_docs)]

pub mod arena;
pub mod ids;
pub mod result;

pub use arena::{Arena, Handle};
pub use ids::{BuildTaskId, EntityKey, HeaderId, ModuleId, PartitionId, ProjectId, SourceId};
pub use result::{AbuildResult, InternalError};
