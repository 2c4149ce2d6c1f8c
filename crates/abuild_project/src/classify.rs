//! Directory and file classification.
//!
//! Directory policy is an ordered table of predicates over [`Settings`]; the
//! first matching rule decides the class, and a directory matching none is
//! [`DirectoryClass::Default`].

use abuild_config::Settings;
use std::fmt;
use std::path::Path;

/// How a directory contributes to project naming and traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectoryClass {
    /// Excluded with its whole subtree.
    Ignore,
    /// Files belong to the parent's project.
    Squash,
    /// Files belong to the parent's project; kept apart from squash for
    /// later stages.
    Skip,
    /// A nested test project of the parent.
    Test,
    /// Starts a project named after the directory.
    Default,
}

impl fmt::Display for DirectoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryClass::Ignore => write!(f, "ignore"),
            DirectoryClass::Squash => write!(f, "squash"),
            DirectoryClass::Skip => write!(f, "skip"),
            DirectoryClass::Test => write!(f, "test"),
            DirectoryClass::Default => write!(f, "default"),
        }
    }
}

/// One entry of the directory policy table.
#[derive(Clone, Copy)]
pub struct DirectoryRule {
    /// The class assigned when the predicate holds.
    pub class: DirectoryClass,
    /// Predicate over the directory's own name.
    pub matches: fn(&Settings, &str) -> bool,
}

/// Directory rules in precedence order.
pub const DIRECTORY_RULES: [DirectoryRule; 4] = [
    DirectoryRule {
        class: DirectoryClass::Ignore,
        matches: Settings::is_ignore_directory,
    },
    DirectoryRule {
        class: DirectoryClass::Squash,
        matches: Settings::is_squash_directory,
    },
    DirectoryRule {
        class: DirectoryClass::Skip,
        matches: Settings::is_skip_directory,
    },
    DirectoryRule {
        class: DirectoryClass::Test,
        matches: Settings::is_test_directory,
    },
];

/// Classifies a directory by its name.
pub fn classify_directory(settings: &Settings, name: &str) -> DirectoryClass {
    DIRECTORY_RULES
        .iter()
        .find(|rule| (rule.matches)(settings, name))
        .map_or(DirectoryClass::Default, |rule| rule.class)
}

/// Whether a file is registered as a source or a header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileClass {
    /// A translation unit.
    Source,
    /// A header.
    Header,
}

/// Classifies a file by extension; `None` for files that are not tracked.
pub fn classify_file(settings: &Settings, path: &Path) -> Option<FileClass> {
    if settings.is_cpp_source(path) {
        Some(FileClass::Source)
    } else if settings.is_cpp_header(path) {
        Some(FileClass::Header)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_and_listed_directories_are_ignored() {
        let settings = Settings::default();
        assert_eq!(classify_directory(&settings, ".git"), DirectoryClass::Ignore);
        assert_eq!(classify_directory(&settings, "build"), DirectoryClass::Ignore);
    }

    #[test]
    fn default_lists() {
        let settings = Settings::default();
        assert_eq!(classify_directory(&settings, "src"), DirectoryClass::Squash);
        assert_eq!(classify_directory(&settings, "include"), DirectoryClass::Squash);
        assert_eq!(classify_directory(&settings, "projects"), DirectoryClass::Skip);
        assert_eq!(classify_directory(&settings, "tests"), DirectoryClass::Test);
        assert_eq!(classify_directory(&settings, "Test"), DirectoryClass::Test);
        assert_eq!(classify_directory(&settings, "engine"), DirectoryClass::Default);
    }

    #[test]
    fn earlier_rule_wins() {
        let settings = Settings {
            squash_directories: vec!["shared".to_string()],
            test_directories: vec!["shared".to_string()],
            ignore_directories: vec!["tests".to_string()],
            ..Settings::default()
        };
        assert_eq!(classify_directory(&settings, "shared"), DirectoryClass::Squash);
        assert_eq!(classify_directory(&settings, "tests"), DirectoryClass::Ignore);
    }

    #[test]
    fn files_by_extension() {
        let settings = Settings::default();
        assert_eq!(classify_file(&settings, Path::new("a/main.cpp")), Some(FileClass::Source));
        assert_eq!(classify_file(&settings, Path::new("a/mod.cppm")), Some(FileClass::Source));
        assert_eq!(classify_file(&settings, Path::new("a/util.hpp")), Some(FileClass::Header));
        assert_eq!(classify_file(&settings, Path::new("a/README.md")), None);
        assert_eq!(classify_file(&settings, Path::new("a/Makefile")), None);
    }
}
