//! Configuration Document Tree
//!
//! Order- and comment-preserving YAML trees with typed path navigation.
//!
//! # Core Concepts
//!
//! - [`Node`]: Scalar, mapping or sequence, carrying its comments and scalar style
//! - [`Document`]: Root node plus document-level trivia; parses and renders YAML
//! - [`NodePath`]: Dotted address such as `contexts.discoverySources`
//! - [`find`] / [`find_mut`]: Locate (or force-create) a node at typed [`Key`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use pcfg_tree::{find_mut, Document, FindOptions, Key, Node};
//!
//! let mut doc = Document::parse(&text)?;
//! let features = find_mut(
//!     doc.root_mut(),
//!     &[Key::mapping("clientOptions"), Key::mapping("features")],
//!     FindOptions::force_create(),
//! )?;
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod convert;
mod document;
mod error;
mod node;
mod path;
mod yaml;

pub use convert::{from_yaml_value, to_yaml_value};
pub use document::Document;
pub use error::{TreeError, TreeResult};
pub use node::{
    is_plain_safe, Comments, Mapping, Node, NodeKind, NodeValue, Scalar, ScalarStyle, ScalarTag,
    Sequence,
};
pub use path::{find, find_mut, FindError, FindOptions, Key, NodePath, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
