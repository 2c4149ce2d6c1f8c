//! The internal error type shared by the abuild crates.

/// Result of an operation that can only fail through a bug in abuild.
///
/// Problems in the scanned tree never surface here. They are appended to the
/// build cache's Error and Warning logs and the operation returns `Ok`.
pub type AbuildResult<T> = Result<T, InternalError>;

/// A broken internal invariant, such as a handle used against a store that
/// did not issue it.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// What went wrong.
    pub message: String,
}

impl InternalError {
    /// Wraps `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed() {
        let err = InternalError::new("dangling handle");
        assert_eq!(err.to_string(), "internal error: dangling handle");
    }

    #[test]
    fn propagates_through_question_mark() {
        fn inner() -> AbuildResult<u32> {
            Err(format!("source {} not in store", 3))?
        }
        assert_eq!(inner().unwrap_err().message, "source 3 not in store");
    }
}
