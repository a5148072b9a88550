//! Paths and navigation within a document tree
//!
//! Provides [`NodePath`] for dotted addressing (`contexts.discoverySources`)
//! and [`find`] / [`find_mut`] for locating, or force-creating, a node at a
//! sequence of typed [`Key`]s.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::node::{Node, NodeKind, NodeValue};

/// Dotted address of a node, such as the key of a patch strategy
///
/// # Examples
/// - `["contexts"]` → `contexts`
/// - `["contexts", "discoverySources"]` → `contexts.discoverySources`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// Path naming one top-level section
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Check if the path addresses the document root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of a child entry, e.g. `contexts` to `contexts.discoverySources`
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Iterate from this path up to (excluding) the root
    ///
    /// `a.b.c` yields `a.b.c`, `a.b`, `a`: the most specific strategy
    /// lookup comes first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (1..=self.0.len()).rev().map(|n| Self(self.0[..n].to_vec()))
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        let segments = s
            .split('.')
            .map(|seg| {
                if seg.trim().is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(Self(segments))
    }
}

impl From<&[Key]> for NodePath {
    fn from(keys: &[Key]) -> Self {
        Self(keys.iter().map(|k| k.name.clone()).collect())
    }
}

/// Errors parsing a [`NodePath`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
}

/// One step of a navigation path: a mapping key and the kind expected there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    name: String,
    kind: Option<NodeKind>,
}

impl Key {
    /// Key accepting any node kind
    #[inline]
    #[must_use]
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }

    /// Key expecting a mapping
    #[inline]
    #[must_use]
    pub fn mapping(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(NodeKind::Mapping),
        }
    }

    /// Key expecting a sequence
    #[inline]
    #[must_use]
    pub fn sequence(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(NodeKind::Sequence),
        }
    }

    /// Mapping key
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected kind, if constrained
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<NodeKind> {
        self.kind
    }
}

/// Navigation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FindError {
    /// A key on the path is absent
    #[error("node not found: {path}")]
    NotFound {
        /// Path up to and including the missing key
        path: NodePath,
    },

    /// A key exists but holds a node of another kind
    #[error("schema mismatch at {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        /// Path of the offending node
        path: NodePath,
        /// Kind the caller asked for
        expected: NodeKind,
        /// Kind actually stored
        found: NodeKind,
    },
}

impl FindError {
    /// Check for the not-found case
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Navigation options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    create: bool,
}

impl FindOptions {
    /// Locate only, never modify the tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create missing keys along the way
    #[inline]
    #[must_use]
    pub fn force_create() -> Self {
        Self { create: true }
    }

    /// Whether missing keys are created
    #[inline]
    #[must_use]
    pub fn creates(&self) -> bool {
        self.create
    }
}

/// Locate the node at `keys`, starting from `root`
///
/// An empty `keys` slice yields `root` itself.
///
/// # Errors
/// - [`FindError::NotFound`] if a key is absent
/// - [`FindError::SchemaMismatch`] if an intermediate node is not a mapping
///   or a node's kind disagrees with its key's expected kind
pub fn find<'a>(root: &'a Node, keys: &[Key]) -> Result<&'a Node, FindError> {
    let mut current = root;
    for (depth, key) in keys.iter().enumerate() {
        let Some(mapping) = current.as_mapping() else {
            return Err(mismatch(keys, depth, NodeKind::Mapping, current.kind()));
        };
        let Some(child) = mapping.get(&key.name) else {
            return Err(FindError::NotFound {
                path: NodePath::from(&keys[..=depth]),
            });
        };
        if let Some(expected) = key.kind {
            if child.kind() != expected {
                return Err(mismatch(keys, depth + 1, expected, child.kind()));
            }
        }
        current = child;
    }
    Ok(current)
}

/// Locate the node at `keys` for modification
///
/// With [`FindOptions::force_create`], every missing key is spliced into its
/// parent as an empty node of the key's expected kind (a mapping when
/// unconstrained). A `null` found where a mapping or sequence is expected is
/// treated as missing and replaced.
///
/// # Errors
/// Same as [`find`]; `NotFound` only when not creating.
pub fn find_mut<'a>(
    root: &'a mut Node,
    keys: &[Key],
    options: FindOptions,
) -> Result<&'a mut Node, FindError> {
    let mut current = root;
    for (depth, key) in keys.iter().enumerate() {
        let found = current.kind();
        let NodeValue::Mapping(mapping) = current.value_mut() else {
            return Err(mismatch(keys, depth, NodeKind::Mapping, found));
        };
        if !mapping.contains_key(&key.name) {
            if !options.create {
                return Err(FindError::NotFound {
                    path: NodePath::from(&keys[..=depth]),
                });
            }
            let kind = key.kind.unwrap_or(NodeKind::Mapping);
            mapping.insert(key.name.clone(), Node::empty(kind));
        }
        let Some(child) = mapping.get_mut(&key.name) else {
            return Err(FindError::NotFound {
                path: NodePath::from(&keys[..=depth]),
            });
        };
        if let Some(expected) = key.kind {
            if child.kind() != expected {
                if options.create && child.is_null() {
                    child.set_value(Node::empty(expected).into_value());
                } else {
                    return Err(mismatch(keys, depth + 1, expected, child.kind()));
                }
            }
        }
        current = child;
    }
    Ok(current)
}

fn mismatch(keys: &[Key], depth: usize, expected: NodeKind, found: NodeKind) -> FindError {
    FindError::SchemaMismatch {
        path: NodePath::from(&keys[..depth]),
        expected,
        found,
    }
}
