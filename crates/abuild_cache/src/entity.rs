//! Entity types owned by the [`BuildCache`](crate::BuildCache).
//!
//! Entities refer to each other only through typed IDs from `abuild_common`.
//! They are plain data: every mutation goes through the store so that the
//! index stays consistent.

use abuild_common::{EntityKey, HeaderId, ModuleId, PartitionId, ProjectId, SourceId};
use abuild_scanner::{FileFacts, Visibility};
use std::fmt;
use std::path::PathBuf;

/// A named group of sources and headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    /// Globally unique project name.
    pub name: String,
    /// Sources registered with this project, in registration order.
    pub sources: Vec<SourceId>,
    /// Headers registered with this project, in registration order.
    pub headers: Vec<HeaderId>,
}

/// What a source file produces when it is a module unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleUnit {
    /// The primary interface of a module.
    Interface(ModuleId),
    /// A partition of a module.
    Partition(PartitionId),
}

/// A C++ translation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// Path as discovered by the project scanner.
    pub path: PathBuf,
    /// The owning project.
    pub project: ProjectId,
    /// Last modified time in seconds since the Unix epoch.
    pub modified: i64,
    /// Facts extracted from the file content.
    pub facts: FileFacts,
    /// The module or partition this source produces, if any.
    pub unit: Option<ModuleUnit>,
}

/// A C++ header file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Path as discovered by the project scanner.
    pub path: PathBuf,
    /// The owning project.
    pub project: ProjectId,
    /// Last modified time in seconds since the Unix epoch.
    pub modified: i64,
    /// Facts extracted from the file content.
    pub facts: FileFacts,
}

/// A named C++ module.
///
/// A module can exist before its interface source is known: a partition
/// declaration creates the module lazily.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    /// Globally unique module name.
    pub name: String,
    /// Visibility of the interface declaration.
    pub visibility: Visibility,
    /// The interface unit, once one has been declared.
    pub source: Option<SourceId>,
    /// Partitions in declaration order.
    pub partitions: Vec<PartitionId>,
}

/// A partition of a C++ module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModulePartition {
    /// Partition name, unique within its module.
    pub name: String,
    /// Visibility of the partition declaration.
    pub visibility: Visibility,
    /// The source declaring this partition.
    pub source: SourceId,
    /// The module this partition belongs to.
    pub module: ModuleId,
}

/// What a build task produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildTaskKind {
    /// Precompile a primary module interface.
    CompileModuleInterface,
    /// Precompile a module partition.
    CompileModulePartition,
    /// Compile an ordinary translation unit.
    CompileSource,
}

impl fmt::Display for BuildTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildTaskKind::CompileModuleInterface => write!(f, "compile module interface"),
            BuildTaskKind::CompileModulePartition => write!(f, "compile module partition"),
            BuildTaskKind::CompileSource => write!(f, "compile source"),
        }
    }
}

/// A unit of work planned for one source or header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTask {
    /// The entity this task was generated for.
    pub entity: EntityKey,
    /// The kind of work.
    pub kind: BuildTaskKind,
    /// The planned output file.
    pub output: PathBuf,
}
