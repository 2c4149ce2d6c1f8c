//! Source locations attached to diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A file path with an optional 1-based line number.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// The file the diagnostic refers to.
    pub path: PathBuf,
    /// The 1-based line, when known.
    pub line: Option<u32>,
}

impl Location {
    /// A location covering a whole file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: None,
        }
    }

    /// A location pointing at a single line in a file.
    pub fn line(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
        }
    }

    /// Returns the path component.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.path.display(), line),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_line() {
        let loc = Location::line("src/main.cpp", 12);
        assert_eq!(loc.to_string(), "src/main.cpp:12");
    }

    #[test]
    fn display_without_line() {
        let loc = Location::file("src/main.cpp");
        assert_eq!(loc.to_string(), "src/main.cpp");
    }
}
