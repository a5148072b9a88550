//! Error types for configuration entity operations

use pcfg_patch::PatchError;
use pcfg_store::StoreError;
use pcfg_tree::{FindError, TreeError};

use crate::types::Target;

/// Main configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Entity or pointer absent
    #[error("{0}")]
    NotFound(String),

    /// Update would change the target of an existing context
    #[error("context {name:?} has target {existing}, refusing to change it to {requested}")]
    TargetImmutable {
        /// Context name
        name: String,
        /// Stored target
        existing: Target,
        /// Target of the update
        requested: Target,
    },

    /// Feature path not of the form `features.<plugin>.<flag>`
    #[error("invalid feature path {0:?} (expected features.<plugin>.<flag>)")]
    InvalidFeaturePath(String),

    /// Feature value that is not a boolean
    #[error("feature {path} has non-boolean value {value:?}")]
    InvalidFeatureValue {
        /// Feature path
        path: String,
        /// Stored value
        value: String,
    },

    /// Unrecognized target name
    #[error("unknown target {0:?}")]
    InvalidTarget(String),

    /// Context target without an endpoint
    #[error("no endpoint for target {0}")]
    NoEndpoint(Target),

    /// Locking, loading or persisting failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Patch could not be applied
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// Entity could not be converted to or from the document
    #[error("document error: {0}")]
    Tree(#[from] TreeError),
}

impl ConfigError {
    /// Create not-found error
    #[inline]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if the error reports a missing entity or pointer
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if the error reports a node of the wrong kind
    #[must_use]
    pub fn is_schema_mismatch(&self) -> bool {
        match self {
            Self::Patch(err) | Self::Store(StoreError::Patch(err)) => err.is_schema_mismatch(),
            Self::Tree(TreeError::Find(err)) | Self::Store(StoreError::Tree(TreeError::Find(err))) => {
                matches!(err, FindError::SchemaMismatch { .. })
            }
            _ => false,
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_retryable())
    }
}

impl From<FindError> for ConfigError {
    fn from(err: FindError) -> Self {
        Self::Patch(PatchError::Find(err))
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pcfg_tree::{NodeKind, NodePath};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn predicates() {
        assert!(ConfigError::not_found("context \"a\" not found").is_not_found());

        let timeout = ConfigError::from(StoreError::LockTimeout {
            path: PathBuf::from(".config.lock"),
            waited: Duration::from_secs(10),
        });
        assert!(timeout.is_retryable());
        assert!(!timeout.is_not_found());

        let mismatch = ConfigError::from(FindError::SchemaMismatch {
            path: NodePath::single("contexts"),
            expected: NodeKind::Sequence,
            found: NodeKind::Scalar,
        });
        assert!(mismatch.is_schema_mismatch());
        assert!(!mismatch.is_retryable());
    }

    #[test]
    fn messages() {
        let err = ConfigError::TargetImmutable {
            name: "ctx".into(),
            existing: Target::Kubernetes,
            requested: Target::MissionControl,
        };
        assert_eq!(
            err.to_string(),
            "context \"ctx\" has target kubernetes, refusing to change it to mission-control"
        );
    }
}
