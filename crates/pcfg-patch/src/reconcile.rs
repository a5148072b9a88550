//! Clearing of replace-strategy subtrees ahead of a merge
//!
//! A plain merge cannot express removal: an incoming list `[C]` merged into
//! `[A, B]` yields `[A, B, C]`. Paths configured as
//! [`PatchStrategy::Replace`] are therefore cleared first, so the merge that
//! follows writes the incoming value into an empty slot.

use pcfg_tree::{Node, NodePath, NodeValue};

use crate::merge::merge;
use crate::strategy::{PatchStrategies, PatchStrategy};

/// Clear every replace-strategy subtree of `existing` that `incoming` also
/// specifies with different content
///
/// `path` is the location of `existing` in the document; sequence items
/// share the path of their sequence. A cleared entry keeps its key position
/// and comments. Subtrees that already hold what the incoming value would
/// produce are left alone, so re-applying identical data changes nothing.
///
/// Returns whether anything was cleared.
pub fn reconcile_for_replace(
    incoming: &Node,
    existing: &mut Node,
    path: &NodePath,
    strategies: &PatchStrategies,
) -> bool {
    match (incoming.value(), existing.value_mut()) {
        (NodeValue::Mapping(inc), NodeValue::Mapping(ex)) => {
            let mut changed = false;
            for (key, child) in ex.iter_mut() {
                let Some(inc_child) = inc.get(key) else {
                    continue;
                };
                let child_path = path.child(key.as_str());
                match strategies.strategy_for(&child_path) {
                    PatchStrategy::Replace => {
                        let mut replacement = Node::empty(inc_child.kind());
                        merge(inc_child, &mut replacement);
                        if !child.same_content(&replacement) {
                            tracing::debug!(path = %child_path, "clearing subtree for replace");
                            child.set_value(Node::empty(inc_child.kind()).into_value());
                            changed = true;
                        }
                    }
                    PatchStrategy::Merge => {
                        changed |= reconcile_for_replace(inc_child, child, &child_path, strategies);
                    }
                }
            }
            changed
        }
        (NodeValue::Sequence(inc), NodeValue::Sequence(ex)) => {
            let mut changed = false;
            for item in ex.iter_mut() {
                let Some(name) = item.get_text("name") else {
                    continue;
                };
                if let Some(inc_item) = inc.iter().find(|i| i.get_text("name") == Some(name)) {
                    changed |= reconcile_for_replace(inc_item, item, path, strategies);
                }
            }
            changed
        }
        _ => false,
    }
}
