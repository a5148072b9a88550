//! Single-entry writes and deletes at a path

use pcfg_tree::{find_mut, FindError, FindOptions, Key, Mapping, Node, NodeKind, NodePath};

use crate::error::PatchResult;
use crate::merge::merge;

/// Write `value` under `key` in the mapping at `parent`, creating the
/// parent path as needed
///
/// An existing entry is merged with `value` so that an equal value leaves
/// the document (and its formatting) untouched. Returns whether anything
/// changed.
///
/// # Errors
/// Returns [`FindError::SchemaMismatch`] if the parent path runs through a
/// node of the wrong kind
pub fn set_entry(root: &mut Node, parent: &[Key], key: &str, value: Node) -> PatchResult<bool> {
    let map = mapping_at(root, parent, FindOptions::force_create())?;
    match map.get_mut(key) {
        Some(existing) => Ok(merge(&value, existing)),
        None => {
            map.insert(key.to_string(), value);
            Ok(true)
        }
    }
}

/// Delete `key` from the mapping at `parent`
///
/// A missing parent or key is not an error. Returns whether an entry was
/// removed.
///
/// # Errors
/// Returns [`FindError::SchemaMismatch`] if the parent path runs through a
/// node of the wrong kind
pub fn remove_entry(root: &mut Node, parent: &[Key], key: &str) -> PatchResult<bool> {
    match mapping_at(root, parent, FindOptions::new()) {
        Ok(map) => Ok(map.shift_remove(key).is_some()),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn mapping_at<'a>(
    root: &'a mut Node,
    parent: &[Key],
    options: FindOptions,
) -> Result<&'a mut Mapping, FindError> {
    let node = find_mut(root, parent, options)?;
    let found = node.kind();
    node.as_mapping_mut().ok_or_else(|| FindError::SchemaMismatch {
        path: NodePath::from(parent),
        expected: NodeKind::Mapping,
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcfg_tree::Document;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_creates_parents() {
        let mut doc = Document::parse("servers: []\n").unwrap();
        let changed = set_entry(
            doc.root_mut(),
            &[Key::mapping("currentContext")],
            "kubernetes",
            Node::string("ctx1"),
        )
        .unwrap();
        assert!(changed);
        assert_eq!(doc.to_yaml_string(), "servers: []\ncurrentContext:\n  kubernetes: ctx1\n");
    }

    #[test]
    fn set_same_value_is_noop() {
        let mut doc = Document::parse("current: ctx1 # active\n").unwrap();
        let changed = set_entry(doc.root_mut(), &[], "current", Node::string("ctx1")).unwrap();
        assert!(!changed);
        assert_eq!(doc.to_yaml_string(), "current: ctx1 # active\n");
    }

    #[test]
    fn set_through_scalar_is_mismatch() {
        let mut doc = Document::parse("currentContext: oops\n").unwrap();
        let err = set_entry(
            doc.root_mut(),
            &[Key::mapping("currentContext")],
            "kubernetes",
            Node::string("x"),
        )
        .unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn remove_missing_is_not_an_error() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        assert!(!remove_entry(doc.root_mut(), &[Key::mapping("currentContext")], "k").unwrap());
        assert!(remove_entry(doc.root_mut(), &[], "a").unwrap());
        assert!(doc.is_empty());
    }
}
