//! Diagnostic codes with category prefixes.
//!
//! Every code the build cache can emit is declared here as a constant so that
//! callers can match on them without string comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a number.
///
/// Displayed as the prefix followed by a zero-padded 3-digit number, e.g. `E001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// A module interface was declared by more than one source.
    pub const DUPLICATE_MODULE: DiagnosticCode = DiagnosticCode::new(Category::Error, 1);
    /// A module partition was declared by more than one source.
    pub const DUPLICATE_PARTITION: DiagnosticCode = DiagnosticCode::new(Category::Error, 2);
    /// A second build task was added for the same entity.
    pub const DUPLICATE_BUILD_TASK: DiagnosticCode = DiagnosticCode::new(Category::Error, 3);
    /// A file contains more than one module declaration.
    pub const CONFLICTING_DECLARATION: DiagnosticCode = DiagnosticCode::new(Category::Error, 4);
    /// A file or directory could not be read.
    pub const UNREADABLE: DiagnosticCode = DiagnosticCode::new(Category::Error, 5);
    /// Module imports form a cycle.
    pub const IMPORT_CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Error, 6);

    /// An imported module is not defined anywhere in the tree.
    pub const UNKNOWN_MODULE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 1);
    /// An imported partition is not defined for the importing module.
    pub const UNKNOWN_PARTITION: DiagnosticCode = DiagnosticCode::new(Category::Warning, 2);
    /// The tokenizer reached end of input inside a comment or literal.
    pub const UNTERMINATED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 3);
    /// A module or import declaration was cut short and ignored.
    pub const INCOMPLETE_DECLARATION: DiagnosticCode = DiagnosticCode::new(Category::Warning, 4);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", DiagnosticCode::DUPLICATE_MODULE), "E001");
        assert_eq!(format!("{}", DiagnosticCode::UNKNOWN_MODULE), "W001");
        assert_eq!(format!("{}", DiagnosticCode::new(Category::Error, 42)), "E042");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::IMPORT_CYCLE;
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
