//! Structured facts extracted from one file.
//!
//! Facts are plain serializable data so that the build cache can persist them
//! and reuse them for files whose modified time has not changed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a module unit is exported (`export module`) or not.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Declared with a leading `export`.
    Exported,
    /// Declared without `export`.
    #[default]
    Internal,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Exported => write!(f, "exported"),
            Visibility::Internal => write!(f, "internal"),
        }
    }
}

/// An `#include` directive.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Include {
    /// The header name without quotes or angle brackets.
    pub header: String,
    /// `true` for `<...>`, `false` for `"..."`.
    pub is_system: bool,
    /// 1-based line of the directive.
    pub line: u32,
}

/// A module interface (`export module X;`) or partition (`module X:Y;`)
/// declaration.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ModuleDeclaration {
    /// The module name, dotted components joined with `.`.
    pub module: String,
    /// The partition name, when the declaration names one.
    pub partition: Option<String>,
    /// Whether the declaration is exported.
    pub visibility: Visibility,
    /// 1-based line of the declaration.
    pub line: u32,
}

impl ModuleDeclaration {
    /// Returns `true` if this declares a partition rather than the primary
    /// interface.
    pub fn is_partition(&self) -> bool {
        self.partition.is_some()
    }
}

/// What an `import` declaration names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import X;`
    Module,
    /// `import :Y;`, a partition of the importing file's own module.
    Partition,
    /// `import <h>;` or `import "h";`, a header unit.
    Header {
        /// `true` for the angle-bracket form.
        is_system: bool,
    },
}

/// An `import` declaration.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Import {
    /// The imported module, partition or header name.
    pub name: String,
    /// What kind of entity is imported.
    pub kind: ImportKind,
    /// `true` for `export import`.
    pub exported: bool,
    /// 1-based line of the declaration.
    pub line: u32,
}

impl Import {
    /// Returns `true` for `import :Y;`.
    pub fn is_partition(&self) -> bool {
        self.kind == ImportKind::Partition
    }
}

/// Everything the code scanner learned about one file.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct FileFacts {
    /// Include directives in source order.
    pub includes: Vec<Include>,
    /// Import declarations in source order.
    pub imports: Vec<Import>,
    /// The first module declaration of the file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<ModuleDeclaration>,
}
