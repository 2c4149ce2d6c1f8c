//! Error types for project scanning.

use abuild_cache::CacheError;
use abuild_common::InternalError;
use abuild_config::ConfigError;
use std::path::PathBuf;

/// Failures that abort a whole scan.
///
/// Problems confined to one file or subdirectory are recorded as
/// diagnostics instead and the scan carries on.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The root directory is missing or unreadable.
    #[error("cannot read project root {path}: {source}")]
    Root {
        /// The root directory.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The persisted cache could not be loaded or saved.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// `abuild.toml` is unreadable or invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A bug in the scan pipeline.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_error_display() {
        let err = ProjectError::Root {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/missing"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn config_error_is_wrapped() {
        let err: ProjectError = ConfigError::Invalid("bad extension".to_string()).into();
        assert!(err.to_string().contains("bad extension"));
    }
}
