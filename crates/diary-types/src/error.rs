//! Error type reported by roster collaborators.

use thiserror::Error;

/// Failure reported by an external collaborator (roster fetch, follow toggle,
/// affinity update).
///
/// Carries only a human-readable message so it can be cloned and handed to
/// every caller waiting on the same request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SourceError {
    message: String,
}

impl SourceError {
    /// Create a new source error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for SourceError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SourceError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
