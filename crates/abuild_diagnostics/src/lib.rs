//! Error and warning facts recorded while scanning a project tree.
//!
//! This crate provides structured [`Diagnostic`] values with a severity, a
//! stable [`DiagnosticCode`], a message and an optional source [`Location`],
//! plus a [`DiagnosticRenderer`] for human-readable output.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
