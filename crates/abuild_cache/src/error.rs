//! Error types for cache persistence.

use abuild_common::InternalError;
use std::path::PathBuf;

/// Errors that stop the cache from loading or saving.
///
/// Conflicts between entities are not errors in this sense; they are
/// recorded as diagnostics on the [`BuildCache`](crate::BuildCache).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing the cache document.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache document is not valid JSON or does not match the schema.
    #[error("failed to parse cache document {path}: {reason}")]
    DocumentParse {
        /// The document path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// The cache document parsed but is internally inconsistent.
    #[error("invalid cache document: {reason}")]
    InvalidDocument {
        /// Description of the inconsistency.
        reason: String,
    },

    /// A serialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A handle was used against a store that did not issue it.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
