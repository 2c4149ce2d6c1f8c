//! Parsing and validation of `abuild.toml` configuration files.
//!
//! This crate produces the read-only [`Settings`] consumed by the project
//! scanner (recognised extensions and directory classification lists) and the
//! opaque [`Toolchain`] records stored in the build cache.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod toolchain;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use toolchain::{Toolchain, ToolchainKind};
pub use types::{AbuildConfig, Settings};
