//! Configuration types deserialized from `abuild.toml`.

use crate::toolchain::Toolchain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The top-level configuration parsed from `abuild.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbuildConfig {
    /// Extension lists and directory classification policy.
    #[serde(default)]
    pub settings: Settings,
    /// Named toolchain records, passed through to the build cache.
    #[serde(default)]
    pub toolchains: BTreeMap<String, Toolchain>,
}

/// Read-only scanning policy: which files are sources or headers and how
/// directories map to project names.
///
/// Extensions include the leading dot (`.cpp`), matching what
/// [`Path::extension`] yields once the dot is prepended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Extensions of files registered as sources.
    pub cpp_source_extensions: Vec<String>,
    /// Extensions of files registered as headers.
    pub cpp_header_extensions: Vec<String>,
    /// Directories excluded together with their whole subtree.
    pub ignore_directories: Vec<String>,
    /// Directories whose files belong to the parent's project.
    pub squash_directories: Vec<String>,
    /// Directories whose files bubble up to the parent's project, kept
    /// separate from squash so later stages can treat them differently.
    pub skip_directories: Vec<String>,
    /// Directories that form a nested test project of their parent.
    pub test_directories: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cpp_source_extensions: strings(&[".cpp", ".cc", ".cxx", ".ixx", ".cppm"]),
            cpp_header_extensions: strings(&[".hpp", ".hh", ".hxx", ".h"]),
            ignore_directories: strings(&["build"]),
            squash_directories: strings(&["src", "include"]),
            skip_directories: strings(&["projects"]),
            test_directories: strings(&["test", "tests", "Test", "Tests"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Settings {
    /// Returns `true` if the file's extension is a configured source extension.
    pub fn is_cpp_source(&self, path: &Path) -> bool {
        has_extension(path, &self.cpp_source_extensions)
    }

    /// Returns `true` if the file's extension is a configured header extension.
    pub fn is_cpp_header(&self, path: &Path) -> bool {
        has_extension(path, &self.cpp_header_extensions)
    }

    /// Returns `true` if the directory name is hidden or in the ignore list.
    pub fn is_ignore_directory(&self, name: &str) -> bool {
        name.starts_with('.') || contains(&self.ignore_directories, name)
    }

    /// Returns `true` if the directory name is in the squash list.
    pub fn is_squash_directory(&self, name: &str) -> bool {
        contains(&self.squash_directories, name)
    }

    /// Returns `true` if the directory name is in the skip list.
    pub fn is_skip_directory(&self, name: &str) -> bool {
        contains(&self.skip_directories, name)
    }

    /// Returns `true` if the directory name is in the test list.
    pub fn is_test_directory(&self, name: &str) -> bool {
        contains(&self.test_directories, name)
    }
}

fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|entry| entry == name)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|candidate| candidate.strip_prefix('.') == Some(ext))
}
