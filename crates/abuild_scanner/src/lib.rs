//! Lightweight lexical scanning of C++ source text.
//!
//! The [`Tokenizer`] turns raw text into a lazy stream of [`Token`]s, skipping
//! comments and keeping literals opaque. The [`code_scanner`] walks that stream
//! and extracts the facts the build cache needs: `#include` directives, module
//! and partition declarations, and imports. Neither is a C++ parser; anything
//! not recognised is ignored.

#![warn(missing_docs)]

pub mod code_scanner;
pub mod facts;
pub mod token;
pub mod tokenizer;

pub use code_scanner::{scan_source, ScanResult};
pub use facts::{FileFacts, Import, ImportKind, Include, ModuleDeclaration, Visibility};
pub use token::{Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
