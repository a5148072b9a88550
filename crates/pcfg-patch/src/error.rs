//! Error types for patch operations

use pcfg_tree::{FindError, NodeKind};

/// Errors produced while patching a document tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Strategy name outside `merge` / `replace`
    #[error("unknown patch strategy '{0}'")]
    UnknownStrategy(String),

    /// Entity node is not a mapping
    #[error("expected an entity mapping, found {0}")]
    NotAnEntity(NodeKind),

    /// Entity mapping lacks a string `name`
    #[error("entity has no 'name' field")]
    MissingName,

    /// Navigation failed
    #[error(transparent)]
    Find(#[from] FindError),
}

impl PatchError {
    /// Check for a kind conflict in the stored document
    #[inline]
    #[must_use]
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::Find(FindError::SchemaMismatch { .. }))
    }
}

/// Result type alias for patch operations
pub type PatchResult<T> = Result<T, PatchError>;
