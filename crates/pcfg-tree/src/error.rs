//! Error types for document parsing and conversion

use crate::path::{FindError, PathError};

/// Errors produced while reading, writing or converting documents
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Text is not valid YAML
    #[error("syntax error at line {line}: {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Construct outside the formatting-preserving subset
    #[error("unsupported construct at line {line}: {construct}")]
    Unsupported {
        /// 1-based line number
        line: usize,
        /// Description of the construct
        construct: String,
    },

    /// Mapping key that is not a scalar
    #[error("unsupported mapping key: {0}")]
    UnsupportedKey(String),

    /// Text rejected by `serde_yaml`, or a value it could not convert
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Navigation failed
    #[error(transparent)]
    Find(#[from] FindError),

    /// Malformed dotted path
    #[error(transparent)]
    Path(#[from] PathError),
}

impl TreeError {
    /// Create syntax error for a line
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Create unsupported-construct error for a line
    pub fn unsupported(line: usize, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            line,
            construct: construct.into(),
        }
    }

    /// Check if the text is valid YAML that the reader does not model
    ///
    /// Such a document cannot be rewritten without losing content, as
    /// opposed to text that is not YAML at all.
    #[inline]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Result type alias for tree operations
pub type TreeResult<T> = Result<T, TreeError>;
