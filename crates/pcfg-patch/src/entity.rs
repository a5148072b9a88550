//! Named entities stored in sequences
//!
//! Entities are mappings identified by their `name` field (exact,
//! case-sensitive match). Updates happen in place; new entities are
//! appended.

use pcfg_tree::{FindError, Node, NodeKind, NodePath, Sequence};

use crate::error::{PatchError, PatchResult};
use crate::merge::merge;
use crate::reconcile::reconcile_for_replace;
use crate::strategy::PatchStrategies;

/// Name of an entity node
///
/// # Errors
/// - [`PatchError::NotAnEntity`] if the node is not a mapping
/// - [`PatchError::MissingName`] if it has no scalar `name`
pub fn entity_name(node: &Node) -> PatchResult<&str> {
    if node.as_mapping().is_none() {
        return Err(PatchError::NotAnEntity(node.kind()));
    }
    node.get_text("name").ok_or(PatchError::MissingName)
}

/// Index of the entity called `name`
///
/// Compares the text of the `name` scalar, so a hand-written `name: 8080`
/// is found as `"8080"`.
#[must_use]
pub fn position(items: &Sequence, name: &str) -> Option<usize> {
    items.iter().position(|item| item.get_text("name") == Some(name))
}

/// Entity called `name` in a sequence node
///
/// Returns `None` when the node is not a sequence or holds no such entity.
#[must_use]
pub fn find_entity<'a>(collection: &'a Node, name: &str) -> Option<&'a Node> {
    let items = collection.as_sequence()?;
    position(items, name).map(|i| &items[i])
}

/// Insert or update an entity in a sequence node
///
/// An existing entity of the same name is reconciled for replace paths and
/// then merged in place; otherwise `incoming` is appended. `path` is the
/// location of the sequence, used for strategy lookup.
///
/// Returns whether the sequence changed.
///
/// # Errors
/// - [`PatchError::Find`] with a schema mismatch if `collection` is not a sequence
/// - [`PatchError::NotAnEntity`] / [`PatchError::MissingName`] for a malformed `incoming`
pub fn upsert_entity(
    collection: &mut Node,
    incoming: &Node,
    path: &NodePath,
    strategies: &PatchStrategies,
) -> PatchResult<bool> {
    let name = entity_name(incoming)?;
    let found = collection.kind();
    let Some(items) = collection.as_sequence_mut() else {
        return Err(FindError::SchemaMismatch {
            path: path.clone(),
            expected: NodeKind::Sequence,
            found,
        }
        .into());
    };
    match position(items, name) {
        Some(index) => {
            let existing = &mut items[index];
            let mut changed = reconcile_for_replace(incoming, existing, path, strategies);
            changed |= merge(incoming, existing);
            tracing::debug!(%path, name, changed, "updated entity");
            Ok(changed)
        }
        None => {
            items.push(incoming.clone());
            tracing::debug!(%path, name, "appended entity");
            Ok(true)
        }
    }
}

/// Remove the entity called `name` from a sequence node
///
/// Returns whether an entity was removed; a non-sequence node is left as is.
pub fn remove_entity(collection: &mut Node, name: &str) -> bool {
    let Some(items) = collection.as_sequence_mut() else {
        return false;
    };
    match position(items, name) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::PatchStrategy;
    use pcfg_tree::Document;
    use pretty_assertions::assert_eq;

    fn contexts(text: &str) -> Document {
        Document::parse(text).unwrap()
    }

    fn entity(text: &str) -> Node {
        Document::parse(text).unwrap().into_root()
    }

    #[test]
    fn update_keeps_position() {
        let mut doc = contexts("- name: a\n  v: 1\n- name: b\n  v: 1\n- name: c\n");
        let changed = upsert_entity(
            doc.root_mut(),
            &entity("name: b\nv: 2\n"),
            &NodePath::single("contexts"),
            &PatchStrategies::new(),
        )
        .unwrap();
        assert!(changed);
        assert_eq!(doc.to_yaml_string(), "- name: a\n  v: 1\n- name: b\n  v: 2\n- name: c\n");
    }

    #[test]
    fn new_entity_is_appended() {
        let mut node = Node::sequence(Vec::new());
        let path = NodePath::single("contexts");
        let ctx = entity("name: a\n");
        assert!(upsert_entity(&mut node, &ctx, &path, &PatchStrategies::new()).unwrap());
        assert!(!upsert_entity(&mut node, &ctx, &path, &PatchStrategies::new()).unwrap());
        assert_eq!(node.as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut doc = contexts("- name: Prod\n");
        let path = NodePath::single("contexts");
        upsert_entity(doc.root_mut(), &entity("name: prod\n"), &path, &PatchStrategies::new())
            .unwrap();
        assert_eq!(doc.root().as_sequence().unwrap().len(), 2);
        assert!(find_entity(doc.root(), "Prod").is_some());
    }

    #[test]
    fn numeric_names_are_matched_by_text() {
        let mut doc = contexts("- name: 8080\n  v: 1\n");
        let path = NodePath::single("contexts");
        let incoming = entity("name: '8080'\nv: 2\n");
        assert!(upsert_entity(doc.root_mut(), &incoming, &path, &PatchStrategies::new()).unwrap());
        assert!(!upsert_entity(doc.root_mut(), &incoming, &path, &PatchStrategies::new()).unwrap());
        assert_eq!(doc.to_yaml_string(), "- name: '8080'\n  v: 2\n");
        assert!(find_entity(doc.root(), "8080").is_some());
        assert!(remove_entity(doc.root_mut(), "8080"));
    }

    #[test]
    fn replace_strategy_applies_within_entity() {
        let table = PatchStrategies::new().with(
            "contexts.discoverySources".parse().unwrap(),
            PatchStrategy::Replace,
        );
        let mut doc = contexts("- name: a\n  discoverySources:\n    - name: A\n    - name: B\n");
        let incoming = entity("name: a\ndiscoverySources:\n  - name: C\n");
        let changed =
            upsert_entity(doc.root_mut(), &incoming, &NodePath::single("contexts"), &table).unwrap();
        assert!(changed);
        assert_eq!(doc.to_yaml_string(), "- name: a\n  discoverySources:\n    - name: C\n");
    }

    #[test]
    fn malformed_incoming_is_rejected() {
        let mut node = Node::sequence(Vec::new());
        let path = NodePath::single("contexts");
        let err = upsert_entity(&mut node, &entity("target: k8s\n"), &path, &PatchStrategies::new())
            .unwrap_err();
        assert_eq!(err, PatchError::MissingName);
        let err = upsert_entity(&mut node, &Node::string("a"), &path, &PatchStrategies::new())
            .unwrap_err();
        assert_eq!(err, PatchError::NotAnEntity(NodeKind::Scalar));
    }

    #[test]
    fn non_sequence_collection_is_mismatch() {
        let mut node = Node::string("oops");
        let err = upsert_entity(
            &mut node,
            &entity("name: a\n"),
            &NodePath::single("contexts"),
            &PatchStrategies::new(),
        )
        .unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn remove_by_name() {
        let mut doc = contexts("- name: a\n- name: b\n");
        assert!(remove_entity(doc.root_mut(), "a"));
        assert!(!remove_entity(doc.root_mut(), "a"));
        assert_eq!(doc.to_yaml_string(), "- name: b\n");
    }
}
