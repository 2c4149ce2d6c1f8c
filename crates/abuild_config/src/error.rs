//! Error types for `abuild.toml` loading.

use std::path::PathBuf;

/// Why a configuration could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The content is not valid TOML or does not match the schema.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// A well-formed value breaks a naming rule.
    #[error("invalid setting: {0}")]
    Invalid(String),
}
