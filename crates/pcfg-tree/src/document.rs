//! Whole documents: a root node plus document-level trivia

use crate::error::TreeResult;
use crate::node::{Mapping, Node};
use crate::yaml;

/// Parsed document
///
/// Owns its tree exclusively; callers load, mutate and persist one instance
/// per operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) root: Node,
    pub(crate) foot: Vec<String>,
    pub(crate) explicit_start: bool,
}

impl Document {
    /// Wrap a root node
    #[inline]
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self {
            root,
            foot: Vec::new(),
            explicit_start: false,
        }
    }

    /// Document whose root is an empty mapping
    #[inline]
    #[must_use]
    pub fn empty_mapping() -> Self {
        Self::new(Node::mapping(Mapping::new()))
    }

    /// Parse YAML text
    ///
    /// Scalar styles, comments, flow collections, block scalars and
    /// indentation are recorded so an untouched document renders back to
    /// the same text.
    ///
    /// # Errors
    /// - [`TreeError::Yaml`] if the text is not valid YAML
    /// - [`TreeError::Unsupported`] for anchors, aliases, tags, multi-line
    ///   flow collections or plain scalars, and complex keys
    ///
    /// [`TreeError::Yaml`]: crate::TreeError::Yaml
    /// [`TreeError::Unsupported`]: crate::TreeError::Unsupported
    pub fn parse(text: &str) -> TreeResult<Self> {
        yaml::parse(text)
    }

    /// Render as YAML text
    #[must_use]
    pub fn to_yaml_string(&self) -> String {
        yaml::emit(self)
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Mutable root node
    #[inline]
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Consume the document, returning the root node
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Comment and blank lines after the last node
    #[inline]
    #[must_use]
    pub fn foot_comments(&self) -> &[String] {
        &self.foot
    }

    /// Replace the trailing comment lines
    #[inline]
    pub fn set_foot_comments(&mut self, foot: Vec<String>) {
        self.foot = foot;
    }

    /// Whether the text started with `---`
    #[inline]
    #[must_use]
    pub fn explicit_start(&self) -> bool {
        self.explicit_start
    }

    /// Set whether rendering starts with `---`
    #[inline]
    pub fn set_explicit_start(&mut self, explicit: bool) {
        self.explicit_start = explicit;
    }

    /// Check for a root that is null or an empty mapping
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_null() || self.root.as_mapping().is_some_and(Mapping::is_empty)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty_mapping()
    }
}

impl From<Node> for Document {
    fn from(root: Node) -> Self {
        Self::new(root)
    }
}
