//! Project naming by directory convention.

use crate::classify::{classify_directory, DirectoryClass};
use abuild_config::Settings;
use std::path::Path;

/// Returns the name of the project that files directly inside `dir` belong
/// to.
///
/// Squash and skip directories defer to their parent. A test directory
/// appends its own name to the parent's project, joined by `_` when the name
/// starts with a lowercase letter (`foo/tests` is `foo_tests`, `foo/Tests`
/// is `fooTests`). Any other directory names its own project. A path with no
/// final component resolves to the empty string.
///
/// Only the path is inspected, never the file system.
pub fn project_name(settings: &Settings, dir: &Path) -> String {
    let Some(name) = dir.file_name() else {
        return String::new();
    };
    let name = name.to_string_lossy();
    let parent = dir.parent().unwrap_or(Path::new(""));

    match classify_directory(settings, &name) {
        DirectoryClass::Squash | DirectoryClass::Skip => project_name(settings, parent),
        DirectoryClass::Test => {
            format!("{}{}{}", project_name(settings, parent), test_separator(&name), name)
        }
        DirectoryClass::Ignore | DirectoryClass::Default => name.into_owned(),
    }
}

fn test_separator(name: &str) -> &'static str {
    match name.chars().next() {
        Some(c) if c.is_lowercase() => "_",
        _ => "",
    }
}
