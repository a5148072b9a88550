//! Error types for document storage

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pcfg_patch::PatchError;
use pcfg_tree::{FindError, TreeError};

/// Errors produced while locking, loading or persisting the document
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File system failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Another holder kept the lock past the configured timeout
    #[error("timed out after {waited:?} waiting for lock {}", .path.display())]
    LockTimeout {
        /// Lock file
        path: PathBuf,
        /// Time spent waiting
        waited: Duration,
    },

    /// Stored text is not a usable document
    ///
    /// Recovered by the loader, which starts from an empty document.
    #[error("malformed document {}: {reason}", .path.display())]
    Malformed {
        /// Offending file
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// Patch metadata could not be read
    ///
    /// Recovered by falling back to default strategies.
    #[error("patch metadata unavailable at {}: {reason}", .path.display())]
    MetadataUnavailable {
        /// Metadata file
        path: PathBuf,
        /// Why it is unavailable
        reason: String,
    },

    /// In-memory document cannot be written
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Patch failure while applying a change
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Document tree failure
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl StoreError {
    /// Create I/O error for a path
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Check if retrying the operation may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}

impl From<FindError> for StoreError {
    fn from(err: FindError) -> Self {
        Self::Patch(PatchError::Find(err))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_is_retryable() {
        let err = StoreError::LockTimeout {
            path: PathBuf::from("/tmp/.config.lock"),
            waited: Duration::from_millis(100),
        };
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "timed out after 100ms waiting for lock /tmp/.config.lock"
        );
    }

    #[test]
    fn io_is_not_retryable() {
        let err = StoreError::io(Path::new("/x"), io::Error::other("boom"));
        assert!(!err.is_retryable());
        assert!(err.to_string().starts_with("I/O error on /x"));
    }
}
